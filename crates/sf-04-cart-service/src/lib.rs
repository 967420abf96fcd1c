//! # sf-04-cart-service
//!
//! Cart Consistency Service: validates caller input, checks products against
//! the catalog and drives the cart store.
//!
//! ## Control Flow
//!
//! ```text
//! raw payload ──validate_cart_data──→ ValidatedLine
//!                                         │
//!                      add_to_cart ───────┤
//!                                         ├── CatalogLookup::find_product (NotFound?)
//!                                         └── CartStore::add (atomic merge)
//!
//! summary ── CartStore::lines ── CatalogLookup (live prices) ──→ {lines, item_count, total}
//! ```
//!
//! ## Error Taxonomy
//!
//! | Error | Kind | Caller sees |
//! |-------|------|-------------|
//! | `InvalidInput` | user-recoverable | field → message map |
//! | `ProductNotFound` | user-recoverable | generic rejection |
//! | `Store` / `Catalog` | infrastructure | generic server error |

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{
    validate_cart_data, CartSummary, FieldErrors, RawCartInput, RawField, SummaryLine,
    ValidatedLine, MAX_QUANTITY_PER_REQUEST,
};
pub use error::{CartError, CartResult};
pub use ports::inbound::CartApi;
pub use service::{CartService, CartServiceConfig};
