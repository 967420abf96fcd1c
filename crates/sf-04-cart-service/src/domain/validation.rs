//! Field-level validation of raw cart payloads.
//!
//! Every field is checked and every complaint is collected; a caller gets
//! the whole report at once, never just the first failure.

use serde::Deserialize;
use shared_types::{FieldErrors, ProductId};
use std::num::NonZeroU32;

/// Largest quantity accepted by a single add request.
pub const MAX_QUANTITY_PER_REQUEST: u32 = 99;

pub const FIELD_PRODUCT_ID: &str = "product_id";
pub const FIELD_QUANTITY: &str = "quantity";

/// An untrusted scalar as it arrived (form field or JSON value).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl RawField {
    /// Integral value, if the field is numeric and whole.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawField::Int(v) => Some(*v),
            RawField::Float(f) => integral(*f),
            RawField::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            RawField::Bool(_) => None,
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15;
    in_range.then_some(f as i64)
}

/// Raw add/update/remove payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCartInput {
    pub product_id: Option<RawField>,
    pub quantity: Option<RawField>,
}

/// A normalized add request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedLine {
    pub product_id: ProductId,
    pub quantity: NonZeroU32,
}

/// Validate an add payload: positive product id, quantity in
/// `1..=max_quantity`.
pub fn validate_cart_data(
    raw: &RawCartInput,
    max_quantity: u32,
) -> Result<ValidatedLine, FieldErrors> {
    let mut errors = FieldErrors::new();

    let product_id = raw
        .product_id
        .as_ref()
        .and_then(RawField::as_integer)
        .and_then(ProductId::new);
    if product_id.is_none() {
        errors.insert(FIELD_PRODUCT_ID, "Valid product ID is required");
    }

    let quantity = match raw.quantity.as_ref().and_then(RawField::as_integer) {
        Some(q) if q <= 0 => {
            errors.insert(FIELD_QUANTITY, "Valid quantity is required");
            None
        }
        Some(q) if q > i64::from(max_quantity) => {
            errors.insert(
                FIELD_QUANTITY,
                format!("Quantity cannot exceed {}", max_quantity),
            );
            None
        }
        Some(q) => u32::try_from(q).ok().and_then(NonZeroU32::new),
        None => {
            errors.insert(FIELD_QUANTITY, "Valid quantity is required");
            None
        }
    };

    match (product_id, quantity) {
        (Some(product_id), Some(quantity)) if errors.is_empty() => Ok(ValidatedLine {
            product_id,
            quantity,
        }),
        _ => Err(errors),
    }
}
