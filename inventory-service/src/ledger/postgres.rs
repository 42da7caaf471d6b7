use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::pooled_connection::{bb8::Pool, AsyncDieselConnectionManager};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{
    NewReservation, NewTire, Reservation, ReservationDetails, StockBand, Tire, TireChanges, TireFilter,
    LOW_STOCK_THRESHOLD,
};
use tracing::{debug, info};

use super::TireLedger;
use crate::error::{InventoryError, InventoryResult};
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

/// Tire Ledger backed by Postgres through a bb8 pool of async diesel connections.
///
/// Each operation checks out its own connection; it goes back to the pool when the
/// guard drops, whichever way the operation ends.
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> InventoryResult<Self> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder().build(config).await?;
        Ok(Self::new(pool))
    }
}

// LIKE wildcards in user text are matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl TireLedger for PgLedger {
    async fn ping(&self) -> InventoryResult<()> {
        let mut conn = self.pool.get().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }

    async fn list_tires(&self, filter: &TireFilter) -> InventoryResult<Vec<Tire>> {
        let mut conn = self.pool.get().await?;

        let mut query = tires::table.select(TireRow::as_select()).into_boxed();
        if let Some(condition) = filter.condition {
            query = query.filter(tires::condition.eq(condition.as_str()));
        }
        if let Some(tire_type) = filter.tire_type {
            query = query.filter(tires::tire_type.eq(tire_type.as_str()));
        }
        match filter.stock_band {
            Some(StockBand::InStock) => query = query.filter(tires::stock.gt(0)),
            Some(StockBand::LowStock) => {
                query = query
                    .filter(tires::stock.gt(0))
                    .filter(tires::stock.lt(LOW_STOCK_THRESHOLD))
            }
            Some(StockBand::OutOfStock) => query = query.filter(tires::stock.eq(0)),
            None => {}
        }
        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(term);
            query = query.filter(
                tires::brand
                    .ilike(pattern.clone())
                    .or(tires::size.ilike(pattern.clone()))
                    .or(tires::tire_type.ilike(pattern)),
            );
        }

        let rows = query
            .order((tires::created_at.desc(), tires::id.desc()))
            .load::<TireRow>(&mut conn)
            .await?;

        debug!("Loaded {} tires", rows.len());
        rows.into_iter().map(Tire::try_from).collect()
    }

    async fn find_tire(&self, id: i32) -> InventoryResult<Option<Tire>> {
        let mut conn = self.pool.get().await?;
        let row = tires::table
            .find(id)
            .select(TireRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Tire::try_from).transpose()
    }

    async fn insert_tire(&self, tire: NewTire) -> InventoryResult<Tire> {
        let mut conn = self.pool.get().await?;
        let row = diesel::insert_into(tires::table)
            .values(NewTireRow::from(tire))
            .returning(TireRow::as_returning())
            .get_result(&mut conn)
            .await?;
        Tire::try_from(row)
    }

    async fn update_tire(&self, id: i32, changes: TireChanges) -> InventoryResult<Tire> {
        let mut conn = self.pool.get().await?;
        let row = diesel::update(tires::table.find(id))
            .set(TireChangeset::new(changes, Utc::now()))
            .returning(TireRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        match row {
            Some(row) => Tire::try_from(row),
            None => Err(InventoryError::tire_not_found(id)),
        }
    }

    async fn delete_tire(&self, id: i32) -> InventoryResult<()> {
        let mut conn = self.pool.get().await?;
        let deleted = diesel::delete(tires::table.find(id)).execute(&mut conn).await?;
        if deleted == 0 {
            return Err(InventoryError::tire_not_found(id));
        }
        Ok(())
    }

    async fn reserve(&self, reservation: NewReservation) -> InventoryResult<Reservation> {
        let mut conn = self.pool.get().await?;
        let tire_id = reservation.tire_id;

        let row = conn
            .transaction::<_, InventoryError, _>(move |conn| {
                Box::pin(async move {
                    // Row lock: concurrent reservations for this tire queue here.
                    let stock = tires::table
                        .find(tire_id)
                        .select(tires::stock)
                        .for_update()
                        .first::<i32>(conn)
                        .await
                        .optional()?;
                    if !stock.is_some_and(|s| s >= 1) {
                        return Err(InventoryError::NotAvailable { tire_id });
                    }

                    let row = diesel::insert_into(reservations::table)
                        .values(NewReservationRow::from(reservation))
                        .returning(ReservationRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let decremented = diesel::update(
                        tires::table
                            .filter(tires::id.eq(tire_id))
                            .filter(tires::stock.gt(0)),
                    )
                    .set((tires::stock.eq(tires::stock - 1), tires::updated_at.eq(Utc::now())))
                    .execute(conn)
                    .await?;
                    if decremented == 0 {
                        return Err(InventoryError::NotAvailable { tire_id });
                    }

                    Ok(row)
                })
            })
            .await?;

        info!("Reservation {} committed for tire {}", row.id, tire_id);
        Ok(row.into())
    }

    async fn list_reservations(&self, customer_name: Option<&str>) -> InventoryResult<Vec<ReservationDetails>> {
        let mut conn = self.pool.get().await?;

        let mut query = reservations::table
            .inner_join(tires::table)
            .select((
                ReservationRow::as_select(),
                tires::brand,
                tires::size,
                tires::tire_type,
                tires::condition,
            ))
            .into_boxed();
        if let Some(customer_name) = customer_name {
            query = query.filter(reservations::customer_name.eq(customer_name.to_string()));
        }

        let rows = query
            .order((reservations::reservation_date.desc(), reservations::id.desc()))
            .load::<ReservationWithTireRow>(&mut conn)
            .await?;

        rows.into_iter().map(reservation_details).collect()
    }
}
