//! The Tire Ledger: the persistent store that owns tires and reservations.
//!
//! Callers never keep tires between operations; every call re-reads the ledger.

mod memory;
mod postgres;

pub use memory::MemoryLedger;
pub use postgres::{DbPool, PgLedger};

use async_trait::async_trait;
use shared::{NewReservation, NewTire, Reservation, ReservationDetails, Tire, TireChanges, TireFilter};

use crate::error::InventoryResult;

#[async_trait]
pub trait TireLedger: Send + Sync {
    /// Round-trips to the store to prove it is reachable.
    async fn ping(&self) -> InventoryResult<()>;

    /// Tires matching `filter`, newest `created_at` first.
    async fn list_tires(&self, filter: &TireFilter) -> InventoryResult<Vec<Tire>>;

    async fn find_tire(&self, id: i32) -> InventoryResult<Option<Tire>>;

    async fn insert_tire(&self, tire: NewTire) -> InventoryResult<Tire>;

    /// Applies `changes` and refreshes `updated_at`. Fails with `NotFound` if `id` is absent.
    async fn update_tire(&self, id: i32, changes: TireChanges) -> InventoryResult<Tire>;

    /// Removes the tire and, by cascade, its reservations.
    async fn delete_tire(&self, id: i32) -> InventoryResult<()>;

    /// Records the reservation and takes one unit of stock as a single unit of work.
    ///
    /// Fails with `NotAvailable` when the tire is missing or out of stock; in that case
    /// nothing is written.
    async fn reserve(&self, reservation: NewReservation) -> InventoryResult<Reservation>;

    /// Reservations for `customer_name` (all when `None`), latest reservation date first.
    async fn list_reservations(&self, customer_name: Option<&str>) -> InventoryResult<Vec<ReservationDetails>>;
}
