//! # Storefront Test Suite
//!
//! Cross-subsystem tests that no single crate can host.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── cart_benchmarks.rs   # merge and summary throughput
//! └── src/
//!     ├── fixtures.rs          # wired subsystems over either store
//!     └── integration/
//!         ├── concurrency.rs   # racing adds, racing token consumption
//!         ├── regeneration.rs  # cart never split by a session rotation
//!         └── flows.rs         # HTTP through the runtime container
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sf-tests
//! cargo test -p sf-tests integration::concurrency
//! cargo bench -p sf-tests
//! ```

pub mod fixtures;
pub mod integration;
