use chrono::NaiveDate;
use shared::{NewReservation, Reservation, ReservationDetails};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::log_storage;
use crate::ledger::TireLedger;

/// Binds customers to tire units.
///
/// An attempt is either committed (reservation stored, stock down by one) or rejected
/// with nothing written; there is no intermediate state.
#[derive(Clone)]
pub struct ReservationService {
    ledger: Arc<dyn TireLedger>,
}

impl ReservationService {
    pub fn new(ledger: Arc<dyn TireLedger>) -> Self {
        Self { ledger }
    }

    pub async fn reserve(
        &self,
        tire_id: i32,
        customer_name: &str,
        reservation_date: NaiveDate,
        notes: Option<&str>,
    ) -> InventoryResult<Reservation> {
        let new_reservation = NewReservation::new(tire_id, customer_name, reservation_date, notes)?;

        match self.ledger.reserve(new_reservation).await {
            Ok(reservation) => {
                info!(
                    "Tire {} reserved for {} on {} (reservation {})",
                    tire_id, reservation.customer_name, reservation.reservation_date, reservation.id
                );
                Ok(reservation)
            }
            Err(e @ InventoryError::NotAvailable { .. }) => {
                warn!("Reservation rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                log_storage(&e);
                Err(e)
            }
        }
    }

    /// All reservations, or only those of `customer_name` when given and non-blank.
    pub async fn list_reservations(&self, customer_name: Option<&str>) -> InventoryResult<Vec<ReservationDetails>> {
        let customer_name = customer_name.map(str::trim).filter(|c| !c.is_empty());
        self.ledger.list_reservations(customer_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryStore;
    use crate::ledger::MemoryLedger;
    use shared::{TireDraft, ValidationError};

    fn services() -> (InventoryStore, ReservationService) {
        let ledger: Arc<dyn TireLedger> = Arc::new(MemoryLedger::new());
        (InventoryStore::new(ledger.clone()), ReservationService::new(ledger))
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    async fn michelin(store: &InventoryStore, stock: i32) -> i32 {
        store
            .create(TireDraft {
                brand: Some("Michelin".into()),
                size: Some("205/55R16".into()),
                tire_type: Some("summer".into()),
                condition: Some("new".into()),
                stock: Some(stock),
                price: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn last_unit_can_be_reserved_exactly_once() {
        let (store, reservations) = services();
        let tire_id = michelin(&store, 1).await;

        let reservation = reservations.reserve(tire_id, "Jansen", june(1), None).await.unwrap();
        assert_eq!(reservation.tire_id, tire_id);
        assert_eq!(reservation.customer_name, "Jansen");
        assert_eq!(store.get_by_id(tire_id).await.unwrap().stock, 0);

        let err = reservations.reserve(tire_id, "Jansen", june(1), None).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotAvailable { .. }));
        assert_eq!(reservations.list_reservations(None).await.unwrap().len(), 1);
        assert_eq!(store.get_by_id(tire_id).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn blank_customer_is_rejected_before_any_write() {
        let (store, reservations) = services();
        let tire_id = michelin(&store, 2).await;

        let err = reservations.reserve(tire_id, " ", june(1), None).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(ValidationError::Missing("customer_name"))));
        assert_eq!(store.get_by_id(tire_id).await.unwrap().stock, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() {
        let (store, reservations) = services();
        let tire_id = michelin(&store, 3).await;

        let attempts = (0..20).map(|i| {
            let reservations = reservations.clone();
            tokio::spawn(async move {
                reservations
                    .reserve(tire_id, &format!("Klant {}", i), june(2), Some("race"))
                    .await
            })
        });
        let results = futures::future::join_all(attempts).await;

        let committed = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Ok(Err(InventoryError::NotAvailable { .. }))))
            .count();
        assert_eq!(committed, 3);
        assert_eq!(rejected, 17);
        assert_eq!(store.get_by_id(tire_id).await.unwrap().stock, 0);
        assert_eq!(reservations.list_reservations(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_customer_filter_lists_everyone() {
        let (store, reservations) = services();
        let tire_id = michelin(&store, 5).await;
        reservations.reserve(tire_id, "Jansen", june(1), Some("winterwissel")).await.unwrap();
        reservations.reserve(tire_id, "Bakker", june(2), None).await.unwrap();

        assert_eq!(reservations.list_reservations(Some("  ")).await.unwrap().len(), 2);
        let jansen = reservations.list_reservations(Some("Jansen")).await.unwrap();
        assert_eq!(jansen.len(), 1);
        assert_eq!(jansen[0].reservation.notes.as_deref(), Some("winterwissel"));
    }
}
