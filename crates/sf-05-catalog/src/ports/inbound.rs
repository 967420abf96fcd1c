//! Driving Ports (API - Inbound)

use crate::domain::RawProductInput;
use crate::error::CatalogResult;
use shared_types::Product;

/// One page of the product listing.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ProductPage {
    pub page: usize,
    pub page_size: usize,
    pub total_products: usize,
    pub products: Vec<Product>,
}

/// Primary Catalog API
pub trait CatalogApi: Send + Sync {
    /// `limit` products starting at `offset`, newest first. Cached.
    fn get_products(&self, limit: usize, offset: usize) -> CatalogResult<Vec<Product>>;

    /// 1-based page of `page_size` products.
    fn get_page(&self, page: usize, page_size: usize) -> CatalogResult<ProductPage>;

    /// `InvalidId` for `id <= 0`. Cached.
    fn get_product(&self, id: i64) -> CatalogResult<Option<Product>>;

    fn total_products(&self) -> CatalogResult<usize>;

    /// Validate and persist. Invalidates the cache.
    fn create_product(&self, raw: &RawProductInput) -> CatalogResult<Product>;

    /// Validate and replace. Invalidates the cache when a product changed.
    fn update_product(&self, id: i64, raw: &RawProductInput) -> CatalogResult<bool>;

    /// Invalidates the cache when a product was deleted.
    fn delete_product(&self, id: i64) -> CatalogResult<bool>;

    fn clear_cache(&self);
}
