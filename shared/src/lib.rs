use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

mod export;
mod stats;
mod validation;

pub use export::write_csv;
pub use stats::InventoryStats;
pub use validation::{parse_reservation_date, validate_name, validate_size, ValidationError, MAX_NAME_LEN};

/// Tires with fewer units than this (but at least one) count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireType {
    #[serde(alias = "zomer")]
    Summer,
    Winter,
    AllSeason,
}

impl TireType {
    pub const ALL: [TireType; 3] = [TireType::Summer, TireType::Winter, TireType::AllSeason];

    pub fn as_str(&self) -> &'static str {
        match self {
            TireType::Summer => "summer",
            TireType::Winter => "winter",
            TireType::AllSeason => "all_season",
        }
    }
}

impl fmt::Display for TireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TireType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "zomer" is what older rows and forms used for summer tires
            "summer" | "zomer" => Ok(TireType::Summer),
            "winter" => Ok(TireType::Winter),
            "all_season" | "all-season" | "all season" => Ok(TireType::AllSeason),
            _ => Err(ValidationError::UnknownTireType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::New, Condition::Used];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Condition::New),
            "used" => Ok(Condition::Used),
            _ => Err(ValidationError::UnknownCondition(s.to_string())),
        }
    }
}

/// Bucket derived from a stock count. `InStock` overlaps `LowStock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockBand {
    pub const ALL: [StockBand; 3] = [StockBand::InStock, StockBand::LowStock, StockBand::OutOfStock];

    pub fn contains(&self, stock: i32) -> bool {
        match self {
            StockBand::InStock => stock > 0,
            StockBand::LowStock => stock > 0 && stock < LOW_STOCK_THRESHOLD,
            StockBand::OutOfStock => stock == 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockBand::InStock => "in_stock",
            StockBand::LowStock => "low_stock",
            StockBand::OutOfStock => "out_of_stock",
        }
    }
}

impl FromStr for StockBand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_stock" => Ok(StockBand::InStock),
            "low_stock" => Ok(StockBand::LowStock),
            "out_of_stock" => Ok(StockBand::OutOfStock),
            _ => Err(ValidationError::UnknownStockBand(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tire {
    pub id: i32,
    pub brand: String,
    pub size: String,
    pub tire_type: TireType,
    pub condition: Condition,
    pub stock: i32,
    pub price: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tire {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// A validated tire ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTire {
    pub brand: String,
    pub size: String,
    pub tire_type: TireType,
    pub condition: Condition,
    pub stock: i32,
    pub price: Option<BigDecimal>,
}

impl NewTire {
    pub fn into_tire(self, id: i32, now: DateTime<Utc>) -> Tire {
        Tire {
            id,
            brand: self.brand,
            size: self.size,
            tire_type: self.tire_type,
            condition: self.condition,
            stock: self.stock,
            price: self.price,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated partial update. `None` leaves the field untouched;
/// `price: Some(None)` clears the price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TireChanges {
    pub brand: Option<String>,
    pub size: Option<String>,
    pub tire_type: Option<TireType>,
    pub condition: Option<Condition>,
    pub stock: Option<i32>,
    pub price: Option<Option<BigDecimal>>,
}

impl TireChanges {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.size.is_none()
            && self.tire_type.is_none()
            && self.condition.is_none()
            && self.stock.is_none()
            && self.price.is_none()
    }

    pub fn apply_to(self, tire: &mut Tire, now: DateTime<Utc>) {
        if let Some(brand) = self.brand {
            tire.brand = brand;
        }
        if let Some(size) = self.size {
            tire.size = size;
        }
        if let Some(tire_type) = self.tire_type {
            tire.tire_type = tire_type;
        }
        if let Some(condition) = self.condition {
            tire.condition = condition;
        }
        if let Some(stock) = self.stock {
            tire.stock = stock;
        }
        if let Some(price) = self.price {
            tire.price = price;
        }
        tire.updated_at = now;
    }
}

/// Unvalidated tire fields as they arrive from a form, a JSON body or the console.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TireDraft {
    pub brand: Option<String>,
    pub size: Option<String>,
    pub tire_type: Option<String>,
    pub condition: Option<String>,
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Option<BigDecimal>>,
}

// Distinguishes `"price": null` (Some(None)) from an absent field (None).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TireFilter {
    pub condition: Option<Condition>,
    pub tire_type: Option<TireType>,
    pub stock_band: Option<StockBand>,
    pub search: Option<String>,
}

impl TireFilter {
    pub fn by_condition(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::default()
        }
    }

    pub fn by_stock_band(stock_band: StockBand) -> Self {
        Self {
            stock_band: Some(stock_band),
            ..Self::default()
        }
    }

    /// Builds a filter from raw query values. Empty values and `all` mean "no filter".
    pub fn from_params(
        condition: Option<&str>,
        tire_type: Option<&str>,
        stock_band: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, ValidationError> {
        fn selected(value: Option<&str>) -> Option<&str> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        }

        Ok(Self {
            condition: selected(condition).map(str::parse::<Condition>).transpose()?,
            tire_type: selected(tire_type).map(str::parse::<TireType>).transpose()?,
            stock_band: selected(stock_band).map(str::parse::<StockBand>).transpose()?,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    /// The trimmed search text, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, tire: &Tire) -> bool {
        if self.condition.is_some_and(|c| c != tire.condition) {
            return false;
        }
        if self.tire_type.is_some_and(|t| t != tire.tire_type) {
            return false;
        }
        if self.stock_band.is_some_and(|band| !band.contains(tire.stock)) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                let needle = term.to_lowercase();
                tire.brand.to_lowercase().contains(&needle)
                    || tire.size.to_lowercase().contains(&needle)
                    || tire.tire_type.as_str().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i32,
    pub tire_id: i32,
    pub customer_name: String,
    pub reservation_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub tire_id: i32,
    pub customer_name: String,
    pub reservation_date: NaiveDate,
    pub notes: Option<String>,
}

impl NewReservation {
    pub fn new(
        tire_id: i32,
        customer_name: &str,
        reservation_date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            tire_id,
            customer_name: validate_name(customer_name, "customer_name")?,
            reservation_date,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }

    pub fn into_reservation(self, id: i32, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id,
            tire_id: self.tire_id,
            customer_name: self.customer_name,
            reservation_date: self.reservation_date,
            notes: self.notes,
            created_at: now,
        }
    }
}

/// A reservation joined with the tire it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub brand: String,
    pub size: String,
    pub tire_type: TireType,
    pub condition: Condition,
}
