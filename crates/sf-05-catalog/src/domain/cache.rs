//! Read-through cache owned by one [`crate::CatalogService`].
//!
//! Lives exactly as long as its service; there is no process-wide state.
//! Every catalog write calls [`CatalogCache::invalidate`].

use dashmap::DashMap;
use shared_types::{Product, ProductId};
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound on cached listing pages.
pub const MAX_CACHED_PAGES: usize = 256;

/// Cached product lookups and listing pages.
///
/// Absent products and empty pages are not cached, so a later insert is
/// visible at once and out-of-range page requests cost no memory.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: DashMap<ProductId, Product>,
    pages: DashMap<(usize, usize), Vec<Product>>,
    /// Bumped by every invalidation; fills computed before it are dropped.
    generation: AtomicU64,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to pass back to the `store_*` calls.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).map(|entry| entry.value().clone())
    }

    pub fn store_product(&self, generation: u64, product: Product) {
        if generation != self.generation() {
            return;
        }
        let id = product.id;
        self.products.insert(id, product);
        // An invalidation may have raced the insert.
        if generation != self.generation() {
            self.products.remove(&id);
        }
    }

    pub fn page(&self, limit: usize, offset: usize) -> Option<Vec<Product>> {
        self.pages
            .get(&(limit, offset))
            .map(|entry| entry.value().clone())
    }

    /// Keep `page` unless it is empty or the page table is full.
    pub fn store_page(&self, generation: u64, limit: usize, offset: usize, page: Vec<Product>) {
        if generation != self.generation() || page.is_empty() {
            return;
        }
        if self.pages.len() >= MAX_CACHED_PAGES && !self.pages.contains_key(&(limit, offset)) {
            return;
        }
        self.pages.insert((limit, offset), page);
        if generation != self.generation() {
            self.pages.remove(&(limit, offset));
        }
    }

    /// Drop everything.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.products.clear();
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.products.len() + self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
