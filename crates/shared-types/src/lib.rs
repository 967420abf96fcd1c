//! # Shared Types Crate
//!
//! Identifiers, value types and ports shared by every storefront subsystem.
//!
//! ## Design Principles
//!
//! - **Typed identity**: a session identifier and a product identifier are
//!   distinct types and can never be mixed up at a call site.
//! - **One durable port**: every subsystem persists through [`KeyValueStore`].
//!   Read-modify-write cycles go through [`KeyValueStore::transact`], never a
//!   separate read followed by a write.
//! - **One key layout**: [`KeyPrefix`] owns the persisted key shapes so the
//!   session subsystem can re-key cart rows without depending on the cart crate.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod security;
pub mod storage;

pub use entities::*;
pub use errors::*;
pub use ports::{CatalogLookup, ManualTimeSource, SystemTimeSource, TimeSource};
pub use security::{constant_time_compare, generate_token_hex, redact};
pub use storage::{
    decode_record, encode_record, transact_with, BatchOperation, InMemoryKVStore, KeyPrefix,
    KeyValueRead, KeyValueStore, ScanResult, TransactionBody,
};
