use serde::{Deserialize, Serialize};

use crate::{Condition, StockBand, Tire};

/// Aggregate counts over one inventory snapshot. Always recomputed, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total: usize,
    pub new_count: usize,
    pub used_count: usize,
    pub total_stock: i64,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl InventoryStats {
    pub fn from_tires(tires: &[Tire]) -> Self {
        tires.iter().fold(Self::default(), |mut stats, tire| {
            stats.total += 1;
            match tire.condition {
                Condition::New => stats.new_count += 1,
                Condition::Used => stats.used_count += 1,
            }
            stats.total_stock += i64::from(tire.stock);
            if StockBand::LowStock.contains(tire.stock) {
                stats.low_stock += 1;
            }
            if StockBand::OutOfStock.contains(tire.stock) {
                stats.out_of_stock += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewTire, TireType};
    use chrono::Utc;

    fn tire(id: i32, condition: Condition, stock: i32) -> Tire {
        NewTire {
            brand: "Vredestein".into(),
            size: "195/65R15".into(),
            tire_type: TireType::Winter,
            condition,
            stock,
            price: None,
        }
        .into_tire(id, Utc::now())
    }

    #[test]
    fn empty_inventory_is_all_zero() {
        assert_eq!(InventoryStats::from_tires(&[]), InventoryStats::default());
    }

    #[test]
    fn counts_conditions_and_bands() {
        let stats = InventoryStats::from_tires(&[tire(1, Condition::New, 3), tire(2, Condition::Used, 0)]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.new_count, 1);
        assert_eq!(stats.used_count, 1);
        assert_eq!(stats.total_stock, 3);
        assert_eq!(stats.low_stock, 1);
        assert_eq!(stats.out_of_stock, 1);
    }

    #[test]
    fn five_or_more_is_not_low() {
        let stats = InventoryStats::from_tires(&[tire(1, Condition::New, 5), tire(2, Condition::New, 12)]);
        assert_eq!(stats.low_stock, 0);
        assert_eq!(stats.total_stock, 17);
    }
}
