//! Cart line domain rules.

pub mod quantity;

pub use quantity::{QuantityCap, SetOutcome};
