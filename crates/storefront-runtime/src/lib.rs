//! # Storefront Runtime Library
//!
//! Exposes the runtime's modules for testing. The entry point is the
//! `storefront` binary in `main.rs`.
//!
//! ## Modules
//!
//! - `adapters/` - RocksDB store and the data directory lock
//! - `container/` - configuration loading and subsystem wiring
//! - `maintenance` - expired-session and abandoned-cart purge
//! - `seed` - catalog seeding from a JSON file

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod error;
pub mod maintenance;
pub mod seed;

pub use container::{load_config, load_config_from, StorefrontContainer};
pub use error::{RuntimeError, RuntimeResult};
pub use maintenance::{Maintenance, MaintenanceReport};
pub use seed::seed_catalog;
