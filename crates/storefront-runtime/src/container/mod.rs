//! # Subsystem Container
//!
//! Owns the durable store and every subsystem built on it.
//!
//! ## Initialization Order
//!
//! ```text
//! DatabaseLock ─→ RocksDbStore ─┬─→ SessionManager (sf-01)
//!                               ├─→ ForgeryGuard   (sf-02)
//!                               ├─→ KvCartStore    (sf-03)
//!                               ├─→ CatalogService (sf-05) ─┐
//!                               └─→ CartService    (sf-04) ←┘ CatalogLookup
//! ```
//!
//! All subsystems share one store and one clock.

pub mod config;

use crate::adapters::{DatabaseLock, RocksDbConfig, RocksDbStore};
use crate::error::RuntimeResult;
use sf_01_session_identity::SessionManager;
use sf_02_forgery_guard::ForgeryGuard;
use sf_03_cart_store::{KvCartStore, QuantityCap};
use sf_04_cart_service::{CartService, CartServiceConfig};
use sf_05_catalog::{CatalogService, KvProductRepository};
use sf_06_api_gateway::{AppState, StorefrontConfig};
use shared_types::{KeyValueStore, SystemTimeSource, TimeSource};
use std::sync::Arc;

pub use config::{load_config, load_config_from};

/// Directory under `storage.data_dir` holding the RocksDB files.
const ROCKSDB_DIR: &str = "rocksdb";

pub struct StorefrontContainer {
    pub config: StorefrontConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn TimeSource>,
    pub sessions: Arc<SessionManager>,
    pub guard: Arc<ForgeryGuard>,
    pub cart_store: Arc<KvCartStore>,
    pub cart: Arc<CartService>,
    pub catalog: Arc<CatalogService>,
    /// Held for the container's lifetime.
    _lock: Option<DatabaseLock>,
}

impl StorefrontContainer {
    /// Lock the data directory, open RocksDB and wire every subsystem.
    pub fn open(config: StorefrontConfig) -> RuntimeResult<Self> {
        let lock = DatabaseLock::acquire(&config.storage.data_dir)?;
        let store = RocksDbStore::open(RocksDbConfig {
            path: config.storage.data_dir.join(ROCKSDB_DIR),
            sync_writes: config.storage.sync_writes,
            ..Default::default()
        })?;
        let mut container = Self::with_store(config, Arc::new(store), Arc::new(SystemTimeSource));
        container._lock = Some(lock);
        Ok(container)
    }

    /// Wire every subsystem over an already opened store.
    pub fn with_store(
        config: StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let policy = config.session.policy();

        let sessions = Arc::new(SessionManager::new(store.clone(), clock.clone(), policy));
        let guard = Arc::new(ForgeryGuard::new(store.clone(), clock.clone(), policy));
        let cart_store = Arc::new(KvCartStore::new(
            store.clone(),
            clock.clone(),
            QuantityCap::new(config.cart.max_line_quantity),
        ));
        let catalog = Arc::new(CatalogService::new(
            Arc::new(KvProductRepository::new(store.clone())),
            clock.clone(),
        ));
        let cart = Arc::new(CartService::new(
            cart_store.clone(),
            catalog.clone(),
            CartServiceConfig {
                max_quantity_per_request: config.cart.max_quantity_per_request,
            },
        ));

        tracing::info!(
            idle_ttl_secs = policy.idle_ttl.as_secs(),
            regeneration_secs = policy.regeneration_interval.as_secs(),
            line_cap = config.cart.max_line_quantity,
            "[runtime] subsystems wired"
        );

        Self {
            config,
            store,
            clock,
            sessions,
            guard,
            cart_store,
            cart,
            catalog,
            _lock: None,
        }
    }

    /// Handler state for the gateway.
    pub fn app_state(&self) -> AppState {
        AppState::new(
            &self.config,
            self.sessions.clone(),
            self.guard.clone(),
            self.cart.clone(),
            self.catalog.clone(),
            self.store.clone(),
        )
    }
}
