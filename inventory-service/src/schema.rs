diesel::table! {
    reservations (id) {
        id -> Int4,
        tire_id -> Int4,
        customer_name -> Varchar,
        reservation_date -> Date,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tires (id) {
        id -> Int4,
        brand -> Varchar,
        size -> Varchar,
        tire_type -> Varchar,
        condition -> Varchar,
        stock -> Int4,
        price -> Nullable<Numeric>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(reservations -> tires (tire_id));

diesel::allow_tables_to_appear_in_same_query!(
    reservations,
    tires,
);
