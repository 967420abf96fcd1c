//! Catalog Service - cached product reads, validated writes

use crate::domain::{validate_product_data, CatalogCache, RawProductInput};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::inbound::{CatalogApi, ProductPage};
use crate::ports::outbound::ProductRepository;
use shared_types::{CatalogLookup, KVStoreError, Product, ProductId, TimeSource};
use std::sync::Arc;

/// Catalog service. Owns its cache.
pub struct CatalogService {
    repository: Arc<dyn ProductRepository>,
    clock: Arc<dyn TimeSource>,
    cache: CatalogCache,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn ProductRepository>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            repository,
            clock,
            cache: CatalogCache::new(),
        }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    fn cached_product(&self, id: ProductId) -> Result<Option<Product>, KVStoreError> {
        if let Some(product) = self.cache.product(id) {
            return Ok(Some(product));
        }
        let generation = self.cache.generation();
        let found = self.repository.find_by_id(id)?;
        if let Some(product) = &found {
            self.cache.store_product(generation, product.clone());
        }
        Ok(found)
    }

    fn parse_id(id: i64) -> CatalogResult<ProductId> {
        ProductId::new(id).ok_or(CatalogError::InvalidId { id })
    }
}

impl CatalogLookup for CatalogService {
    fn find_product(&self, id: ProductId) -> Result<Option<Product>, KVStoreError> {
        self.cached_product(id)
    }
}

impl CatalogApi for CatalogService {
    fn get_products(&self, limit: usize, offset: usize) -> CatalogResult<Vec<Product>> {
        if let Some(page) = self.cache.page(limit, offset) {
            return Ok(page);
        }
        let generation = self.cache.generation();
        let page = self.repository.find_all(limit, offset)?;
        self.cache
            .store_page(generation, limit, offset, page.clone());
        Ok(page)
    }

    fn get_page(&self, page: usize, page_size: usize) -> CatalogResult<ProductPage> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let offset = (page - 1).saturating_mul(page_size);
        Ok(ProductPage {
            page,
            page_size,
            total_products: self.total_products()?,
            products: self.get_products(page_size, offset)?,
        })
    }

    fn get_product(&self, id: i64) -> CatalogResult<Option<Product>> {
        Ok(self.cached_product(Self::parse_id(id)?)?)
    }

    fn total_products(&self) -> CatalogResult<usize> {
        Ok(self.repository.count()?)
    }

    fn create_product(&self, raw: &RawProductInput) -> CatalogResult<Product> {
        let draft = validate_product_data(raw).map_err(CatalogError::InvalidInput)?;
        let product = self.repository.create(draft, self.clock.now())?;
        self.cache.invalidate();
        tracing::info!(product = %product.id, name = %product.name, "[sf-05] product created");
        Ok(product)
    }

    fn update_product(&self, id: i64, raw: &RawProductInput) -> CatalogResult<bool> {
        let id = Self::parse_id(id)?;
        let draft = validate_product_data(raw).map_err(CatalogError::InvalidInput)?;
        let updated = self.repository.update(id, draft)?;
        if updated {
            self.cache.invalidate();
            tracing::info!(product = %id, "[sf-05] product updated");
        }
        Ok(updated)
    }

    fn delete_product(&self, id: i64) -> CatalogResult<bool> {
        let id = Self::parse_id(id)?;
        let deleted = self.repository.delete(id)?;
        if deleted {
            self.cache.invalidate();
            tracing::info!(product = %id, "[sf-05] product deleted");
        }
        Ok(deleted)
    }

    fn clear_cache(&self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::KvProductRepository;
    use crate::domain::PriceField;
    use shared_types::{ErrorKind, InMemoryKVStore, ManualTimeSource, Money};
    use std::time::Duration;

    fn raw(name: &str, price: &str) -> RawProductInput {
        RawProductInput {
            name: Some(name.to_string()),
            price: Some(PriceField::Text(price.to_string())),
            ..Default::default()
        }
    }

    fn service() -> (Arc<InMemoryKVStore>, Arc<ManualTimeSource>, CatalogService) {
        let store = Arc::new(InMemoryKVStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let repo = Arc::new(KvProductRepository::new(store.clone()));
        (store, clock.clone(), CatalogService::new(repo, clock))
    }

    #[test]
    fn test_lookup_is_cached_until_write() {
        let (store, _, catalog) = service();
        let lamp = catalog.create_product(&raw("Lamp", "10.00")).unwrap();

        assert!(catalog.find_product(lamp.id).unwrap().is_some());
        assert!(!catalog.cache().is_empty());

        // Served from cache even while the store is down.
        store.set_available(false);
        assert!(catalog.find_product(lamp.id).unwrap().is_some());
        store.set_available(true);

        catalog
            .update_product(lamp.id.get() as i64, &raw("Lamp", "12.00"))
            .unwrap();
        assert_eq!(
            catalog.find_product(lamp.id).unwrap().unwrap().price,
            Money::from_cents(1_200)
        );
    }

    #[test]
    fn test_listing_reflects_create_and_delete() {
        let (_, clock, catalog) = service();
        catalog.create_product(&raw("a", "1")).unwrap();
        assert_eq!(catalog.get_products(10, 0).unwrap().len(), 1);

        clock.advance(Duration::from_secs(1));
        let b = catalog.create_product(&raw("b", "2")).unwrap();
        let page = catalog.get_products(10, 0).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, b.id);

        assert!(catalog.delete_product(b.id.get() as i64).unwrap());
        assert_eq!(catalog.get_products(10, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_get_page_is_one_based() {
        let (_, clock, catalog) = service();
        for i in 0..12 {
            clock.advance(Duration::from_secs(1));
            catalog.create_product(&raw(&format!("p{}", i), "1")).unwrap();
        }
        let first = catalog.get_page(1, 10).unwrap();
        assert_eq!(first.products.len(), 10);
        assert_eq!(first.total_products, 12);
        let second = catalog.get_page(2, 10).unwrap();
        assert_eq!(second.products.len(), 2);
        assert_eq!(catalog.get_page(0, 10).unwrap().page, 1);
    }

    #[test]
    fn test_get_product_rejects_non_positive_id() {
        let (_, _, catalog) = service();
        let err = catalog.get_product(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(catalog.get_product(5).unwrap().is_none());
    }

    #[test]
    fn test_invalid_product_is_not_stored() {
        let (store, _, catalog) = service();
        let err = catalog.create_product(&raw("", "0")).unwrap_err();
        match err {
            CatalogError::InvalidInput(fields) => assert_eq!(fields.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_out_of_range_pages_leave_cache_bounded() {
        let (_, _, catalog) = service();
        for page in 1..=50_000 {
            assert!(catalog.get_page(page, 10).unwrap().products.is_empty());
        }
        assert!(catalog.cache().is_empty());

        catalog.create_product(&raw("only", "1")).unwrap();
        assert_eq!(catalog.get_page(1, 10).unwrap().products.len(), 1);
        for page in 2..=1_000 {
            catalog.get_page(page, 10).unwrap();
        }
        assert_eq!(catalog.cache().page_count(), 1);
    }

    #[test]
    fn test_absent_lookup_is_not_cached() {
        let (_, _, catalog) = service();
        let id = ProductId::new(1).unwrap();
        assert!(catalog.find_product(id).unwrap().is_none());
        catalog.create_product(&raw("first", "1")).unwrap();
        assert!(catalog.find_product(id).unwrap().is_some());
    }
}
