use async_trait::async_trait;
use chrono::Utc;
use shared::{NewReservation, NewTire, Reservation, ReservationDetails, Tire, TireChanges, TireFilter};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::TireLedger;
use crate::error::{InventoryError, InventoryResult};

#[derive(Default)]
struct State {
    tires: BTreeMap<i32, Tire>,
    reservations: BTreeMap<i32, Reservation>,
    last_tire_id: i32,
    last_reservation_id: i32,
}

/// In-process Tire Ledger for tests and database-less runs. Nothing survives a restart.
///
/// Every operation holds the lock for its whole duration, so `reserve` is atomic.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> InventoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| InventoryError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> InventoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| InventoryError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl TireLedger for MemoryLedger {
    async fn ping(&self) -> InventoryResult<()> {
        self.read().map(|_| ())
    }

    async fn list_tires(&self, filter: &TireFilter) -> InventoryResult<Vec<Tire>> {
        let state = self.read()?;
        let mut tires: Vec<Tire> = state.tires.values().filter(|t| filter.matches(t)).cloned().collect();
        tires.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tires)
    }

    async fn find_tire(&self, id: i32) -> InventoryResult<Option<Tire>> {
        Ok(self.read()?.tires.get(&id).cloned())
    }

    async fn insert_tire(&self, tire: NewTire) -> InventoryResult<Tire> {
        let mut state = self.write()?;
        state.last_tire_id += 1;
        let tire = tire.into_tire(state.last_tire_id, Utc::now());
        state.tires.insert(tire.id, tire.clone());
        Ok(tire)
    }

    async fn update_tire(&self, id: i32, changes: TireChanges) -> InventoryResult<Tire> {
        let mut state = self.write()?;
        let tire = state.tires.get_mut(&id).ok_or_else(|| InventoryError::tire_not_found(id))?;
        changes.apply_to(tire, Utc::now());
        Ok(tire.clone())
    }

    async fn delete_tire(&self, id: i32) -> InventoryResult<()> {
        let mut state = self.write()?;
        if state.tires.remove(&id).is_none() {
            return Err(InventoryError::tire_not_found(id));
        }
        state.reservations.retain(|_, r| r.tire_id != id);
        Ok(())
    }

    async fn reserve(&self, reservation: NewReservation) -> InventoryResult<Reservation> {
        let mut state = self.write()?;
        let tire_id = reservation.tire_id;

        let tire = match state.tires.get_mut(&tire_id) {
            Some(tire) if tire.stock >= 1 => tire,
            _ => return Err(InventoryError::NotAvailable { tire_id }),
        };
        let now = Utc::now();
        tire.stock -= 1;
        tire.updated_at = now;

        state.last_reservation_id += 1;
        let reservation = reservation.into_reservation(state.last_reservation_id, now);
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn list_reservations(&self, customer_name: Option<&str>) -> InventoryResult<Vec<ReservationDetails>> {
        let state = self.read()?;
        let mut details: Vec<ReservationDetails> = state
            .reservations
            .values()
            .filter(|r| customer_name.map_or(true, |name| r.customer_name == name))
            .filter_map(|r| {
                state.tires.get(&r.tire_id).map(|tire| ReservationDetails {
                    reservation: r.clone(),
                    brand: tire.brand.clone(),
                    size: tire.size.clone(),
                    tire_type: tire.tire_type,
                    condition: tire.condition,
                })
            })
            .collect();
        details.sort_by(|a, b| {
            b.reservation
                .reservation_date
                .cmp(&a.reservation.reservation_date)
                .then(b.reservation.id.cmp(&a.reservation.id))
        });
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::{Condition, TireType};

    fn michelin(stock: i32) -> NewTire {
        NewTire {
            brand: "Michelin".into(),
            size: "205/55R16".into(),
            tire_type: TireType::Summer,
            condition: Condition::New,
            stock,
            price: None,
        }
    }

    fn reservation(tire_id: i32, customer: &str, day: u32) -> NewReservation {
        NewReservation::new(tire_id, customer, NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), None).unwrap()
    }

    #[tokio::test]
    async fn ids_are_assigned_in_sequence() {
        let ledger = MemoryLedger::new();
        let a = ledger.insert_tire(michelin(1)).await.unwrap();
        let b = ledger.insert_tire(michelin(1)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn newest_tires_come_first() {
        let ledger = MemoryLedger::new();
        for _ in 0..3 {
            ledger.insert_tire(michelin(1)).await.unwrap();
        }
        let ids: Vec<i32> = ledger
            .list_tires(&TireFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn reserve_out_of_stock_writes_nothing() {
        let ledger = MemoryLedger::new();
        let tire = ledger.insert_tire(michelin(0)).await.unwrap();

        let err = ledger.reserve(reservation(tire.id, "Jansen", 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotAvailable { tire_id } if tire_id == tire.id));
        assert!(ledger.list_reservations(None).await.unwrap().is_empty());
        assert_eq!(ledger.find_tire(tire.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn reserve_missing_tire_is_not_available() {
        let ledger = MemoryLedger::new();
        let err = ledger.reserve(reservation(42, "Jansen", 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotAvailable { tire_id: 42 }));
    }

    #[tokio::test]
    async fn delete_cascades_to_reservations() {
        let ledger = MemoryLedger::new();
        let kept = ledger.insert_tire(michelin(2)).await.unwrap();
        let doomed = ledger.insert_tire(michelin(2)).await.unwrap();
        ledger.reserve(reservation(kept.id, "Jansen", 1)).await.unwrap();
        ledger.reserve(reservation(doomed.id, "Jansen", 2)).await.unwrap();
        ledger.reserve(reservation(doomed.id, "Bakker", 3)).await.unwrap();

        ledger.delete_tire(doomed.id).await.unwrap();

        let left = ledger.list_reservations(None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].reservation.tire_id, kept.id);
        assert!(matches!(
            ledger.delete_tire(doomed.id).await,
            Err(InventoryError::NotFound { entity: "tire", .. })
        ));
    }

    #[tokio::test]
    async fn reservations_filter_by_customer_and_sort_by_date() {
        let ledger = MemoryLedger::new();
        let tire = ledger.insert_tire(michelin(5)).await.unwrap();
        ledger.reserve(reservation(tire.id, "Jansen", 3)).await.unwrap();
        ledger.reserve(reservation(tire.id, "Bakker", 9)).await.unwrap();
        ledger.reserve(reservation(tire.id, "Jansen", 7)).await.unwrap();

        let jansen = ledger.list_reservations(Some("Jansen")).await.unwrap();
        let days: Vec<String> = jansen
            .iter()
            .map(|d| d.reservation.reservation_date.to_string())
            .collect();
        assert_eq!(days, vec!["2024-06-07", "2024-06-03"]);
        assert_eq!(jansen[0].brand, "Michelin");
        assert_eq!(ledger.list_reservations(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_missing_tire_is_not_found() {
        let ledger = MemoryLedger::new();
        let err = ledger.update_tire(7, TireChanges::default()).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { id: 7, .. }));
    }
}
