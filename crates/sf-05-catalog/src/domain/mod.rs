//! Catalog domain: product field validation and the read-through cache.

pub mod cache;
pub mod validation;

pub use cache::CatalogCache;
pub use validation::{validate_product_data, PriceField, ProductDraft, RawProductInput};
