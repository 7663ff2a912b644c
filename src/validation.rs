//! Per-entity validation helpers.
//!
//! Entities implement [`validator::Validate`] by hand with these checks; request
//! formats derive it. Nothing here holds state between calls.

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Fractional digits a stored price may carry.
pub const PRICE_SCALE: u32 = 2;

/// Exclusive upper bound of a stored price (`NUMERIC(12, 2)`).
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

fn price_violation(price: &Decimal) -> Option<&'static str> {
    if price.is_sign_negative() && !price.is_zero() {
        Some("non_negative")
    } else if price.normalize().scale() > PRICE_SCALE {
        Some("scale")
    } else if *price >= PRICE_LIMIT {
        Some("too_large")
    } else {
        None
    }
}

/// A single `overflow` violation on `field`.
pub fn overflow(field: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new("overflow"));
    errors
}

/// Collects violations for one entity.
#[derive(Debug)]
pub struct Violations(ValidationErrors);

impl Default for Violations {
    fn default() -> Self { Self(ValidationErrors::new()) }
}

impl Violations {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, field: &'static str, code: &'static str) {
        self.0.add(field, ValidationError::new(code));
    }

    pub fn required_id(&mut self, field: &'static str, value: Uuid) {
        if value.is_nil() { self.add(field, "required"); }
    }

    pub fn required_text(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() { self.add(field, "required"); }
    }

    pub fn positive(&mut self, field: &'static str, value: i32) {
        if value < 1 { self.add(field, "positive"); }
    }

    pub fn non_negative(&mut self, field: &'static str, value: i32) {
        if value < 0 { self.add(field, "non_negative"); }
    }

    /// Non-negative, at most two fractional digits and below [`PRICE_LIMIT`].
    pub fn price(&mut self, field: &'static str, value: Decimal) {
        if let Some(code) = price_violation(&value) { self.add(field, code); }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.errors().is_empty() { Ok(()) } else { Err(self.0) }
    }
}

/// `custom` validator for request prices.
pub fn storable_price(price: &Decimal) -> Result<(), ValidationError> {
    match price_violation(price) {
        Some(code) => Err(ValidationError::new(code)),
        None => Ok(()),
    }
}
