//! # sf-05-catalog
//!
//! Product catalog: pass-through persistence, field validation for writes,
//! and the read-through cache that backs [`shared_types::CatalogLookup`] for
//! the cart.
//!
//! ```text
//! CartService ──find_product──→ CatalogService ──miss──→ ProductRepository
//!                                   │    ↑                     │
//!                                   │    └──── fill ───────────┘
//!                                   └── create/update/delete → invalidate()
//! ```
//!
//! The cache belongs to one service instance. Prices always come from the
//! latest catalog state visible to that instance.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::KvProductRepository;
pub use domain::{validate_product_data, CatalogCache, PriceField, ProductDraft, RawProductInput};
pub use error::{CatalogError, CatalogResult};
pub use ports::inbound::{CatalogApi, ProductPage};
pub use ports::outbound::ProductRepository;
pub use service::CatalogService;

/// Products per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 10;
