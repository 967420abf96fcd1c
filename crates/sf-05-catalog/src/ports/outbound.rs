//! Driven Ports (SPI - Outbound)

use crate::domain::ProductDraft;
use shared_types::{KVStoreError, Product, ProductId, Timestamp};

/// Pass-through product persistence.
pub trait ProductRepository: Send + Sync {
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, KVStoreError>;

    /// Newest first.
    fn find_all(&self, limit: usize, offset: usize) -> Result<Vec<Product>, KVStoreError>;

    fn count(&self) -> Result<usize, KVStoreError>;

    /// Persist a new product under a freshly allocated id.
    fn create(&self, draft: ProductDraft, now: Timestamp) -> Result<Product, KVStoreError>;

    /// Replace the fields of an existing product. `false` when absent.
    fn update(&self, id: ProductId, draft: ProductDraft) -> Result<bool, KVStoreError>;

    /// `false` when absent.
    fn delete(&self, id: ProductId) -> Result<bool, KVStoreError>;
}
