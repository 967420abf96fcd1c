//! Product repository over the durable key-value port.

use crate::domain::ProductDraft;
use crate::ports::outbound::ProductRepository;
use shared_types::{
    decode_record, encode_record, transact_with, BatchOperation, KVStoreError, KeyPrefix,
    KeyValueStore, Product, ProductId, Timestamp,
};
use std::sync::Arc;

const PRODUCT_SEQUENCE: &str = "product-seq";

/// Products under `product:{id}`, ids drawn from `meta:product-seq`.
pub struct KvProductRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvProductRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn all(&self) -> Result<Vec<Product>, KVStoreError> {
        self.store
            .prefix_scan(&KeyPrefix::Product.family())?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }
}

impl ProductRepository for KvProductRepository {
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, KVStoreError> {
        self.store
            .get(&KeyPrefix::product(id))?
            .map(|bytes| decode_record(&bytes))
            .transpose()
    }

    fn find_all(&self, limit: usize, offset: usize) -> Result<Vec<Product>, KVStoreError> {
        let mut products = self.all()?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products.into_iter().skip(offset).take(limit).collect())
    }

    fn count(&self) -> Result<usize, KVStoreError> {
        Ok(self.store.prefix_scan(&KeyPrefix::Product.family())?.len())
    }

    fn create(&self, draft: ProductDraft, now: Timestamp) -> Result<Product, KVStoreError> {
        let sequence_key = KeyPrefix::meta(PRODUCT_SEQUENCE);
        transact_with(self.store.as_ref(), |view| {
            let last: u64 = match view.get(&sequence_key)? {
                Some(bytes) => decode_record(&bytes)?,
                None => 0,
            };
            let next = last.saturating_add(1);
            let id = i64::try_from(next)
                .ok()
                .and_then(ProductId::new)
                .ok_or_else(|| KVStoreError::Unavailable {
                    message: "product id space exhausted".to_string(),
                })?;
            let product = Product {
                id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                price: draft.price,
                image_path: draft.image_path.clone(),
                created_at: now,
            };
            let ops = vec![
                BatchOperation::put(sequence_key.clone(), encode_record(&next)?),
                BatchOperation::put(KeyPrefix::product(id), encode_record(&product)?),
            ];
            Ok::<_, KVStoreError>((ops, product))
        })
    }

    fn update(&self, id: ProductId, draft: ProductDraft) -> Result<bool, KVStoreError> {
        let key = KeyPrefix::product(id);
        transact_with(self.store.as_ref(), |view| {
            let mut product: Product = match view.get(&key)? {
                Some(bytes) => decode_record(&bytes)?,
                None => return Ok((Vec::new(), false)),
            };
            product.name = draft.name.clone();
            product.description = draft.description.clone();
            product.price = draft.price;
            product.image_path = draft.image_path.clone();
            Ok::<_, KVStoreError>((
                vec![BatchOperation::put(key.clone(), encode_record(&product)?)],
                true,
            ))
        })
    }

    fn delete(&self, id: ProductId) -> Result<bool, KVStoreError> {
        let key = KeyPrefix::product(id);
        transact_with(self.store.as_ref(), |view| {
            if view.get(&key)?.is_none() {
                return Ok((Vec::new(), false));
            }
            Ok::<_, KVStoreError>((vec![BatchOperation::delete(key.clone())], true))
        })
    }
}
