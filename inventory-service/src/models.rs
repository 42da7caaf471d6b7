use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use shared::{
    Condition, NewReservation, NewTire, Reservation, ReservationDetails, Tire, TireChanges, TireType,
};

use crate::error::InventoryError;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tires)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TireRow {
    pub id: i32,
    pub brand: String,
    pub size: String,
    pub tire_type: String,
    pub condition: String,
    pub stock: i32,
    pub price: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::tires)]
pub struct NewTireRow {
    pub brand: String,
    pub size: String,
    pub tire_type: &'static str,
    pub condition: &'static str,
    pub stock: i32,
    pub price: Option<BigDecimal>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::tires)]
pub struct TireChangeset {
    pub brand: Option<String>,
    pub size: Option<String>,
    pub tire_type: Option<&'static str>,
    pub condition: Option<&'static str>,
    pub stock: Option<i32>,
    pub price: Option<Option<BigDecimal>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: i32,
    pub tire_id: i32,
    pub customer_name: String,
    pub reservation_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct NewReservationRow {
    pub tire_id: i32,
    pub customer_name: String,
    pub reservation_date: NaiveDate,
    pub notes: Option<String>,
}

/// A reservation row joined with the tire columns shown next to it.
pub type ReservationWithTireRow = (ReservationRow, String, String, String, String);

impl TryFrom<TireRow> for Tire {
    type Error = InventoryError;

    fn try_from(row: TireRow) -> Result<Self, Self::Error> {
        let tire_type = row
            .tire_type
            .parse::<TireType>()
            .map_err(|e| InventoryError::Storage(format!("tire {}: {}", row.id, e)))?;
        let condition = row
            .condition
            .parse::<Condition>()
            .map_err(|e| InventoryError::Storage(format!("tire {}: {}", row.id, e)))?;

        Ok(Tire {
            id: row.id,
            brand: row.brand,
            size: row.size,
            tire_type,
            condition,
            stock: row.stock,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<NewTire> for NewTireRow {
    fn from(tire: NewTire) -> Self {
        Self {
            brand: tire.brand,
            size: tire.size,
            tire_type: tire.tire_type.as_str(),
            condition: tire.condition.as_str(),
            stock: tire.stock,
            price: tire.price,
        }
    }
}

impl TireChangeset {
    pub fn new(changes: TireChanges, updated_at: DateTime<Utc>) -> Self {
        Self {
            brand: changes.brand,
            size: changes.size,
            tire_type: changes.tire_type.map(|t| t.as_str()),
            condition: changes.condition.map(|c| c.as_str()),
            stock: changes.stock,
            price: changes.price,
            updated_at,
        }
    }
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            tire_id: row.tire_id,
            customer_name: row.customer_name,
            reservation_date: row.reservation_date,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

impl From<NewReservation> for NewReservationRow {
    fn from(reservation: NewReservation) -> Self {
        Self {
            tire_id: reservation.tire_id,
            customer_name: reservation.customer_name,
            reservation_date: reservation.reservation_date,
            notes: reservation.notes,
        }
    }
}

pub fn reservation_details(row: ReservationWithTireRow) -> Result<ReservationDetails, InventoryError> {
    let (reservation, brand, size, tire_type, condition) = row;
    let id = reservation.id;
    Ok(ReservationDetails {
        reservation: reservation.into(),
        brand,
        size,
        tire_type: tire_type
            .parse::<TireType>()
            .map_err(|e| InventoryError::Storage(format!("reservation {}: {}", id, e)))?,
        condition: condition
            .parse::<Condition>()
            .map_err(|e| InventoryError::Storage(format!("reservation {}: {}", id, e)))?,
    })
}
