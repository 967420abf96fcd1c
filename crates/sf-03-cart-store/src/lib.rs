//! # sf-03-cart-store
//!
//! Durable mapping from `(session, product)` to quantity.
//!
//! ## Merge Semantics
//!
//! `add` accumulates: two concurrent "add 1" requests for the same product
//! leave quantity 2, never 1. The read of the existing line and the write of
//! the merged line happen inside one store transaction.
//!
//! ```text
//! add(S, 7, 2)          → [{7, qty: 2}]
//! add(S, 7, 3)          → [{7, qty: 5}]
//! set_quantity(S, 7, 1) → [{7, qty: 1}]
//! set_quantity(S, 7, 0) → []
//! ```
//!
//! Aggregates are derived on every read; prices are never stored on a line.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::quantity::MAX_LINE_QUANTITY;
pub use domain::{QuantityCap, SetOutcome};
pub use error::{CartStoreError, CartStoreResult};
pub use ports::inbound::{CartStore, LivenessCheck};
pub use service::KvCartStore;
