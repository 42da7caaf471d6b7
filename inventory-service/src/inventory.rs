use shared::{write_csv, InventoryStats, StockBand, Tire, TireDraft, TireFilter};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{InventoryError, InventoryResult};
use crate::ledger::TireLedger;

/// Tire records: listing, lookup, create/update/delete and the derived stats.
#[derive(Clone)]
pub struct InventoryStore {
    ledger: Arc<dyn TireLedger>,
}

impl InventoryStore {
    pub fn new(ledger: Arc<dyn TireLedger>) -> Self {
        Self { ledger }
    }

    pub async fn check_connection(&self) -> InventoryResult<()> {
        self.ledger.ping().await
    }

    pub async fn list(&self, filter: &TireFilter) -> InventoryResult<Vec<Tire>> {
        self.ledger.list_tires(filter).await
    }

    /// Tires that can be reserved, ordered by brand (ignoring case) then size.
    pub async fn available(&self) -> InventoryResult<Vec<Tire>> {
        let mut tires = self.ledger.list_tires(&TireFilter::by_stock_band(StockBand::InStock)).await?;
        tires.sort_by_cached_key(|t| (t.brand.to_lowercase(), t.size.clone()));
        Ok(tires)
    }

    pub async fn get_by_id(&self, id: i32) -> InventoryResult<Tire> {
        self.ledger
            .find_tire(id)
            .await?
            .ok_or_else(|| InventoryError::tire_not_found(id))
    }

    pub async fn create(&self, draft: TireDraft) -> InventoryResult<Tire> {
        let new_tire = draft.into_new_tire()?;
        let tire = self.ledger.insert_tire(new_tire).await.inspect_err(log_storage)?;
        info!("Tire {} added: {} {} ({}, {})", tire.id, tire.brand, tire.size, tire.tire_type, tire.condition);
        Ok(tire)
    }

    pub async fn update(&self, id: i32, draft: TireDraft) -> InventoryResult<Tire> {
        let changes = draft.into_changes()?;
        let tire = self.ledger.update_tire(id, changes).await.inspect_err(log_storage)?;
        info!("Tire {} updated", tire.id);
        Ok(tire)
    }

    pub async fn delete(&self, id: i32) -> InventoryResult<()> {
        self.ledger.delete_tire(id).await.inspect_err(log_storage)?;
        info!("Tire {} deleted", id);
        Ok(())
    }

    /// Counts over the current snapshot, recomputed on every call.
    pub async fn stats(&self) -> InventoryResult<InventoryStats> {
        let tires = self.ledger.list_tires(&TireFilter::default()).await?;
        Ok(InventoryStats::from_tires(&tires))
    }

    pub async fn export_csv(&self, filter: &TireFilter) -> InventoryResult<Vec<u8>> {
        let tires = self.ledger.list_tires(filter).await?;
        let mut out = Vec::new();
        write_csv(&mut out, &tires).map_err(|e| InventoryError::Storage(format!("CSV export failed: {}", e)))?;
        Ok(out)
    }
}

pub(crate) fn log_storage(err: &InventoryError) {
    if let InventoryError::Storage(message) = err {
        error!("Ledger write failed: {}", message);
    }
}
