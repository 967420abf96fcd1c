//! # Shared Outbound Ports
//!
//! Interfaces more than one subsystem depends on.

use crate::entities::{Product, ProductId, Timestamp};
use crate::errors::KVStoreError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Read-only product lookup consulted by the cart core.
///
/// Implementations must return current prices; the cart never snapshots them.
pub trait CatalogLookup: Send + Sync {
    /// `Ok(None)` when no product has this id.
    fn find_product(&self, id: ProductId) -> Result<Option<Product>, KVStoreError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Milliseconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Time source driven by the caller. Used by tests across the workspace.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
