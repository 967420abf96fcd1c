//! Cart service domain: raw input validation and the derived cart summary.

pub mod summary;
pub mod validation;

pub use summary::{CartSummary, SummaryLine};
pub use shared_types::FieldErrors;
pub use validation::{
    validate_cart_data, RawCartInput, RawField, ValidatedLine, MAX_QUANTITY_PER_REQUEST,
};
