pub mod api;
pub mod error;
pub mod inventory;
pub mod ledger;
mod models;
pub mod reservations;
mod schema;

use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tracing::info;

pub use error::{InventoryError, InventoryResult};
pub use inventory::InventoryStore;
pub use ledger::{MemoryLedger, PgLedger, TireLedger};
pub use reservations::ReservationService;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates or upgrades the tires/reservations schema.
pub fn run_migrations(database_url: &str) -> InventoryResult<()> {
    info!("Running database migrations...");
    let mut conn = PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| InventoryError::Storage(format!("Migration error: {}", e)))?;
    info!("Migrations completed successfully ({} applied)", applied.len());
    Ok(())
}

/// Both services over one shared ledger handle.
pub fn services(ledger: Arc<dyn TireLedger>) -> (InventoryStore, ReservationService) {
    (InventoryStore::new(ledger.clone()), ReservationService::new(ledger))
}
