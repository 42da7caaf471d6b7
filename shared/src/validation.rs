use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_traits::Signed;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::{Condition, NewTire, TireChanges, TireDraft, TireType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid tire size '{0}', expected a size like 205/55R16")]
    InvalidSize(String),

    #[error("stock cannot be negative (got {0})")]
    NegativeStock(i32),

    #[error("price cannot be negative (got {0})")]
    NegativePrice(String),

    #[error("unknown tire type '{0}', expected summer, winter or all_season")]
    UnknownTireType(String),

    #[error("unknown condition '{0}', expected new or used")]
    UnknownCondition(String),

    #[error("unknown stock filter '{0}', expected in_stock, low_stock or out_of_stock")]
    UnknownStockBand(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("price {0} is too large")]
    PriceTooLarge(String),

    #[error("price {0} has more than two decimals")]
    PriceTooPrecise(String),

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Longest brand or customer name the tires and reservations tables hold.
pub const MAX_NAME_LEN: usize = 100;

// DECIMAL(10, 2): eight digits before the point.
const PRICE_LIMIT: i64 = 100_000_000;

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{3}/\d{2}R\d{2}$").expect("tire size pattern is valid"))
}

/// Checks a size such as `205/55R16` and returns it trimmed.
pub fn validate_size(size: &str) -> Result<String, ValidationError> {
    let size = size.trim();
    if size.is_empty() {
        return Err(ValidationError::Missing("size"));
    }
    if !size_pattern().is_match(size) {
        return Err(ValidationError::InvalidSize(size.to_string()));
    }
    Ok(size.to_string())
}

pub fn parse_reservation_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Trims a required name and checks it fits its column.
pub fn validate_name(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong { field, max: MAX_NAME_LEN });
    }
    Ok(value.to_string())
}

fn validate_brand(brand: &str) -> Result<String, ValidationError> {
    validate_name(brand, "brand")
}

fn validate_stock(stock: i32) -> Result<i32, ValidationError> {
    if stock < 0 {
        return Err(ValidationError::NegativeStock(stock));
    }
    Ok(stock)
}

fn validate_price(price: Option<BigDecimal>) -> Result<Option<BigDecimal>, ValidationError> {
    match price {
        Some(p) if p.is_negative() => Err(ValidationError::NegativePrice(p.to_string())),
        Some(p) if p.with_scale(2) != p => Err(ValidationError::PriceTooPrecise(p.to_string())),
        Some(p) if p >= BigDecimal::from(PRICE_LIMIT) => Err(ValidationError::PriceTooLarge(p.to_string())),
        Some(p) => Ok(Some(p.with_scale(2))),
        None => Ok(None),
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::Missing(field))
}

impl TireDraft {
    /// Validates every field needed to create a tire. Stock defaults to zero.
    pub fn into_new_tire(self) -> Result<NewTire, ValidationError> {
        Ok(NewTire {
            brand: validate_brand(required(&self.brand, "brand")?)?,
            size: validate_size(required(&self.size, "size")?)?,
            tire_type: required(&self.tire_type, "tire_type")?.parse::<TireType>()?,
            condition: required(&self.condition, "condition")?.parse::<Condition>()?,
            stock: validate_stock(self.stock.unwrap_or(0))?,
            price: validate_price(self.price.flatten())?,
        })
    }

    /// Validates the fields present in the draft; absent fields stay untouched.
    pub fn into_changes(self) -> Result<TireChanges, ValidationError> {
        Ok(TireChanges {
            brand: self.brand.as_deref().map(validate_brand).transpose()?,
            size: self.size.as_deref().map(validate_size).transpose()?,
            tire_type: self.tire_type.as_deref().map(str::parse::<TireType>).transpose()?,
            condition: self.condition.as_deref().map(str::parse::<Condition>).transpose()?,
            stock: self.stock.map(validate_stock).transpose()?,
            price: match self.price {
                Some(price) => Some(validate_price(price)?),
                None => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft() -> TireDraft {
        TireDraft {
            brand: Some("Michelin".into()),
            size: Some("205/55R16".into()),
            tire_type: Some("summer".into()),
            condition: Some("new".into()),
            stock: Some(1),
            price: None,
        }
    }

    #[test]
    fn size_must_match_pattern() {
        assert_eq!(validate_size(" 225/45R17 ").unwrap(), "225/45R17");
        assert_eq!(validate_size("").unwrap_err(), ValidationError::Missing("size"));
        for bad in ["205/55/R16", "2055R16", "205/55r16", "205/55R16X"] {
            assert_eq!(validate_size(bad).unwrap_err(), ValidationError::InvalidSize(bad.to_string()));
        }
    }

    #[test]
    fn complete_draft_becomes_new_tire() {
        let tire = draft().into_new_tire().unwrap();
        assert_eq!(tire.brand, "Michelin");
        assert_eq!(tire.tire_type, TireType::Summer);
        assert_eq!(tire.condition, Condition::New);
        assert_eq!(tire.stock, 1);
        assert_eq!(tire.price, None);
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let mut d = draft();
        d.brand = Some("  ".into());
        assert_eq!(d.into_new_tire().unwrap_err(), ValidationError::Missing("brand"));

        let mut d = draft();
        d.condition = None;
        assert_eq!(d.into_new_tire().unwrap_err(), ValidationError::Missing("condition"));

        let mut d = draft();
        d.tire_type = None;
        assert_eq!(d.into_new_tire().unwrap_err(), ValidationError::Missing("tire_type"));
    }

    #[test]
    fn stock_defaults_to_zero_and_rejects_negative() {
        let mut d = draft();
        d.stock = None;
        assert_eq!(d.into_new_tire().unwrap().stock, 0);

        let mut d = draft();
        d.stock = Some(-1);
        assert_eq!(d.into_new_tire().unwrap_err(), ValidationError::NegativeStock(-1));
    }

    #[test]
    fn price_is_scaled_to_cents_and_never_negative() {
        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("89.5").unwrap()));
        assert_eq!(d.into_new_tire().unwrap().price, Some(BigDecimal::from_str("89.50").unwrap()));

        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("-1").unwrap()));
        assert!(matches!(d.into_new_tire(), Err(ValidationError::NegativePrice(_))));
    }

    #[test]
    fn sub_cent_prices_are_rejected_not_truncated() {
        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("89.999").unwrap()));
        assert_eq!(d.into_new_tire().unwrap_err(), ValidationError::PriceTooPrecise("89.999".into()));

        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("89.9900").unwrap()));
        assert_eq!(d.into_new_tire().unwrap().price, Some(BigDecimal::from_str("89.99").unwrap()));
    }

    #[test]
    fn price_must_fit_ten_digits_with_two_decimals() {
        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("99999999.99").unwrap()));
        assert!(d.into_new_tire().is_ok());

        let mut d = draft();
        d.price = Some(Some(BigDecimal::from_str("100000000").unwrap()));
        assert!(matches!(d.into_new_tire(), Err(ValidationError::PriceTooLarge(_))));
    }

    #[test]
    fn brand_is_limited_to_column_width() {
        let mut d = draft();
        d.brand = Some("B".repeat(MAX_NAME_LEN));
        assert!(d.into_new_tire().is_ok());

        let mut d = draft();
        d.brand = Some("B".repeat(150));
        assert_eq!(
            d.into_new_tire().unwrap_err(),
            ValidationError::TooLong { field: "brand", max: MAX_NAME_LEN }
        );

        let changes = TireDraft {
            brand: Some("B".repeat(101)),
            ..TireDraft::default()
        };
        assert!(matches!(changes.into_changes(), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let changes = TireDraft {
            stock: Some(3),
            price: Some(None),
            ..TireDraft::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.stock, Some(3));
        assert_eq!(changes.price, Some(None));
        assert_eq!(changes.brand, None);

        let bad = TireDraft {
            size: Some("big".into()),
            ..TireDraft::default()
        };
        assert_eq!(bad.into_changes().unwrap_err(), ValidationError::InvalidSize("big".into()));
    }

    #[test]
    fn reservation_dates_are_iso() {
        assert_eq!(
            parse_reservation_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(
            parse_reservation_date("01-06-2024").unwrap_err(),
            ValidationError::InvalidDate("01-06-2024".into())
        );
    }
}
