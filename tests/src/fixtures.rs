//! Wired storefront over an in-memory or RocksDB store with a manual clock.

use sf_05_catalog::{CatalogApi, PriceField, RawProductInput};
use sf_06_api_gateway::StorefrontConfig;
use shared_types::{InMemoryKVStore, KeyValueStore, ManualTimeSource};
use std::sync::Arc;
use storefront_runtime::adapters::{RocksDbConfig, RocksDbStore};
use storefront_runtime::StorefrontContainer;
use tempfile::TempDir;

/// Start of every fixture clock (2023-11-14, milliseconds).
pub const EPOCH_MS: u64 = 1_700_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    RocksDb,
}

pub const BACKENDS: [Backend; 2] = [Backend::Memory, Backend::RocksDb];

pub struct Fixture {
    pub container: StorefrontContainer,
    pub clock: Arc<ManualTimeSource>,
    _dir: Option<TempDir>,
}

impl Fixture {
    /// Subsystems over `backend`, with `products` catalog entries priced
    /// 10.00 each (ids `1..=products`).
    pub fn new(backend: Backend, products: usize) -> Self {
        Self::with_config(backend, products, test_config())
    }

    pub fn with_config(backend: Backend, products: usize, config: StorefrontConfig) -> Self {
        let clock = Arc::new(ManualTimeSource::new(EPOCH_MS));
        let (store, dir): (Arc<dyn KeyValueStore>, Option<TempDir>) = match backend {
            Backend::Memory => (Arc::new(InMemoryKVStore::new()), None),
            Backend::RocksDb => {
                let dir = TempDir::new().expect("temp dir");
                let store = RocksDbStore::open(RocksDbConfig::for_testing(dir.path().join("db")))
                    .expect("open rocksdb");
                (Arc::new(store), Some(dir))
            }
        };

        let container = StorefrontContainer::with_store(config, store, clock.clone());
        for n in 1..=products {
            container
                .catalog
                .create_product(&RawProductInput {
                    name: Some(format!("Product {}", n)),
                    description: Some(String::new()),
                    price: Some(PriceField::Text("10.00".to_string())),
                    image_path: None,
                })
                .expect("seed product");
        }

        Self {
            container,
            clock,
            _dir: dir,
        }
    }
}

/// Defaults with rate limiting off and plain-HTTP cookies.
pub fn test_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::default();
    config.rate_limit.enabled = false;
    config.session.cookie_secure = false;
    config
}
