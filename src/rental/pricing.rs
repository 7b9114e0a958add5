//! Rent, service fee and security deposit derivation.
//!
//! The same quote is shown to the buyer as a preview and recomputed here when
//! the request is stored, so every formula is deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Product;

/// Flat service fee added to every rental
pub const SERVICE_FEE: f64 = 50.0;

/// Derived deposits never exceed this share of the retail price
pub const RETAIL_DEPOSIT_CAP: f64 = 0.4;

/// Tolerance used when comparing a client preview against the stored quote
const TOTAL_TOLERANCE: f64 = 0.005;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("End date must be after start date")]
    InvalidWindow,

    #[error("Rental must last at least one hour")]
    TooShort,

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Quoted total {expected:.2} does not match computed total {actual:.2}")]
    TotalMismatch { expected: f64, actual: f64 },
}

/// Clothing categories that drive the deposit multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Tops,
    Hoodies,
    Jackets,
    Dresses,
    Bottoms,
    Shoes,
    Accessories,
    Other,
}

impl ProductCategory {
    /// Parse the free-text category stored on the product
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "tops" => ProductCategory::Tops,
            "hoodies" => ProductCategory::Hoodies,
            "jackets" => ProductCategory::Jackets,
            "dresses" => ProductCategory::Dresses,
            "bottoms" => ProductCategory::Bottoms,
            "shoes" => ProductCategory::Shoes,
            "accessories" => ProductCategory::Accessories,
            _ => ProductCategory::Other,
        }
    }

    pub fn deposit_multiplier(&self) -> f64 {
        match self {
            ProductCategory::Tops | ProductCategory::Hoodies => 0.5,
            ProductCategory::Accessories => 1.5,
            ProductCategory::Jackets
            | ProductCategory::Dresses
            | ProductCategory::Bottoms
            | ProductCategory::Shoes
            | ProductCategory::Other => 1.0,
        }
    }
}

/// Product attributes the quote depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    pub hourly_price: f64,
    pub retail_price: f64,
    pub category: ProductCategory,
    pub deposit_override: Option<f64>,
}

impl From<&Product> for PricingInput {
    fn from(product: &Product) -> Self {
        Self {
            hourly_price: product.price,
            retail_price: product.retail_price,
            category: ProductCategory::from_label(&product.category),
            deposit_override: product.security_deposit,
        }
    }
}

/// Breakdown of what the renter pays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub duration_hours: i64,
    pub hourly_price: f64,
    pub total_rent: f64,
    pub service_fee: f64,
    pub security_deposit: f64,
    pub final_total: f64,
}

impl PriceQuote {
    /// Check a client-side preview against this quote
    pub fn ensure_matches(&self, expected: f64) -> Result<(), PricingError> {
        if (self.final_total - expected).abs() > TOTAL_TOLERANCE {
            return Err(PricingError::TotalMismatch {
                expected,
                actual: self.final_total,
            });
        }
        Ok(())
    }
}

/// Whole hours between start and end, rounded to the nearest hour
pub fn duration_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, PricingError> {
    if end <= start {
        return Err(PricingError::InvalidWindow);
    }
    let millis = (end - start).num_milliseconds() as f64;
    let hours = (millis / 3_600_000.0).round() as i64;
    if hours <= 0 {
        return Err(PricingError::TooShort);
    }
    Ok(hours)
}

/// Explicit override when positive, otherwise
/// `ceil(min(total_rent * multiplier, retail_price * 0.4))`
pub fn security_deposit(input: &PricingInput, total_rent: f64) -> f64 {
    if let Some(value) = input.deposit_override.filter(|v| *v > 0.0) {
        return value;
    }
    let by_category = total_rent * input.category.deposit_multiplier();
    let cap = input.retail_price * RETAIL_DEPOSIT_CAP;
    by_category.min(cap).ceil().max(0.0)
}

/// Quote a rental of `hours` hours
pub fn quote(input: &PricingInput, hours: i64) -> Result<PriceQuote, PricingError> {
    if !input.hourly_price.is_finite() || input.hourly_price < 0.0 {
        return Err(PricingError::InvalidPrice(format!(
            "hourly price {} is not valid",
            input.hourly_price
        )));
    }
    if hours <= 0 {
        return Err(PricingError::TooShort);
    }

    let total_rent = input.hourly_price * hours as f64;
    let deposit = security_deposit(input, total_rent);

    Ok(PriceQuote {
        duration_hours: hours,
        hourly_price: input.hourly_price,
        total_rent,
        service_fee: SERVICE_FEE,
        security_deposit: deposit,
        final_total: total_rent + SERVICE_FEE + deposit,
    })
}

/// Quote a rental for a date window
pub fn quote_window(
    input: &PricingInput,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<PriceQuote, PricingError> {
    quote(input, duration_hours(start, end)?)
}

/// Cost of extending a rental by `additional_hours` at its snapshot price
pub fn extension_cost(hourly_price: f64, additional_hours: i64) -> f64 {
    hourly_price * additional_hours as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn input(category: &str, retail: f64, deposit: Option<f64>) -> PricingInput {
        PricingInput {
            hourly_price: 100.0,
            retail_price: retail,
            category: ProductCategory::from_label(category),
            deposit_override: deposit,
        }
    }

    #[test]
    fn test_accessories_deposit_capped_by_retail() {
        let q = quote(&input("Accessories", 2000.0, None), 10).unwrap();
        assert_eq!(q.total_rent, 1000.0);
        assert_eq!(q.security_deposit, 800.0);
        assert_eq!(q.final_total, 1850.0);
    }

    #[test]
    fn test_tops_use_half_multiplier() {
        let q = quote(&input("Tops", 10_000.0, None), 5).unwrap();
        assert_eq!(q.security_deposit, 250.0);
        assert_eq!(q.final_total, 500.0 + 50.0 + 250.0);
    }

    #[test]
    fn test_deposit_is_rounded_up() {
        let mut i = input("Hoodies", 10_000.0, None);
        i.hourly_price = 33.3;
        let q = quote(&i, 1).unwrap();
        assert_eq!(q.security_deposit, 17.0);
    }

    #[test]
    fn test_unknown_category_defaults_to_one() {
        assert_eq!(ProductCategory::from_label("Sarees"), ProductCategory::Other);
        let q = quote(&input("Sarees", 10_000.0, None), 3).unwrap();
        assert_eq!(q.security_deposit, 300.0);
    }

    #[test]
    fn test_override_ignores_multiplier() {
        let q = quote(&input("Accessories", 2000.0, Some(123.0)), 10).unwrap();
        assert_eq!(q.security_deposit, 123.0);
        assert_eq!(q.final_total, 1000.0 + 50.0 + 123.0);

        // zero override falls back to derivation
        let q = quote(&input("Accessories", 2000.0, Some(0.0)), 10).unwrap();
        assert_eq!(q.security_deposit, 800.0);
    }

    #[test]
    fn test_duration_hours_rounds() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(duration_hours(start, start + Duration::hours(10)), Ok(10));
        assert_eq!(duration_hours(start, start + Duration::minutes(90)), Ok(2));
        assert_eq!(duration_hours(start, start), Err(PricingError::InvalidWindow));
        assert_eq!(
            duration_hours(start, start + Duration::minutes(20)),
            Err(PricingError::TooShort)
        );
    }

    #[test]
    fn test_preview_mismatch_detected() {
        let q = quote(&input("Dresses", 5000.0, None), 2).unwrap();
        assert!(q.ensure_matches(q.final_total).is_ok());
        assert!(matches!(
            q.ensure_matches(q.final_total + 1.0),
            Err(PricingError::TotalMismatch { .. })
        ));
    }

    #[test]
    fn test_extension_cost() {
        assert_eq!(extension_cost(40.0, 6), 240.0);
    }
}
