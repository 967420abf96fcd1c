//! # Durable Key-Value Port
//!
//! Every persisted record in the storefront lives behind [`KeyValueStore`].
//!
//! ```text
//! ┌────────────┐  transact(body)   ┌──────────────────────────────┐
//! │ subsystem  │ ────────────────→ │ store (write exclusion held) │
//! │  service   │                   │  1. body reads via view      │
//! │            │ ←──────────────── │  2. body returns batch       │
//! └────────────┘   Ok / Err        │  3. batch applied atomically │
//!                                  └──────────────────────────────┘
//! ```
//!
//! ## Atomicity Guarantee
//!
//! Either ALL operations in a batch are applied, or NONE are. A `transact`
//! body observes a state no concurrent writer can change before its batch
//! lands, so read-modify-write cycles never lose updates.

use crate::entities::{ProductId, SessionId};
use crate::errors::KVStoreError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Key/value pairs returned by a prefix scan, in ascending key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Read access handed to a transaction body.
pub trait KeyValueRead {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// All pairs whose key starts with `prefix`, ascending.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Transaction body: reads through the view, returns the batch to apply.
pub type TransactionBody<'a> =
    dyn FnMut(&dyn KeyValueRead) -> Result<Vec<BatchOperation>, KVStoreError> + 'a;

/// Abstract interface for the durable store.
///
/// Production uses the RocksDB adapter in the runtime crate; tests use
/// [`InMemoryKVStore`].
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Iterate over keys with a prefix.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Execute an atomic batch write.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Run `body` under the store's write exclusion and apply the batch it
    /// returns atomically. An `Err` from `body` applies nothing.
    fn transact(&self, body: &mut TransactionBody<'_>) -> Result<(), KVStoreError>;
}

/// [`KeyValueStore::transact`] for bodies that produce a value or fail with a
/// domain error.
///
/// A body error aborts the transaction: nothing is written and the error is
/// returned as is. Store failures convert into `E`.
pub fn transact_with<S, T, E, F>(store: &S, mut body: F) -> Result<T, E>
where
    S: KeyValueStore + ?Sized,
    E: From<KVStoreError>,
    F: FnMut(&dyn KeyValueRead) -> Result<(Vec<BatchOperation>, T), E>,
{
    let mut produced: Option<Result<T, E>> = None;
    store.transact(&mut |view| match body(view) {
        Ok((ops, value)) => {
            produced = Some(Ok(value));
            Ok(ops)
        }
        Err(err) => {
            produced = Some(Err(err));
            Ok(Vec::new())
        }
    })?;
    produced.unwrap_or_else(|| {
        Err(KVStoreError::Unavailable {
            message: "transaction body was not run".to_string(),
        }
        .into())
    })
}

// =============================================================================
// RECORD CODEC
// =============================================================================

/// Encode a record for storage.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, KVStoreError> {
    bincode::serialize(record).map_err(|e| KVStoreError::Serialization {
        message: e.to_string(),
    })
}

/// Decode a stored record.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, KVStoreError> {
    bincode::deserialize(bytes).map_err(|e| KVStoreError::Serialization {
        message: e.to_string(),
    })
}

// =============================================================================
// KEY LAYOUT
// =============================================================================

/// Persisted key families.
///
/// | Family           | Key                              |
/// |------------------|----------------------------------|
/// | `CartLine`       | `cart:{session}:{product:020}`   |
/// | `Session`        | `session:{session}`              |
/// | `RetiredSession` | `session-retired:{session}`      |
/// | `Product`        | `product:{product:020}`          |
/// | `Meta`           | `meta:{name}`                    |
///
/// Product ids are zero padded so byte order equals numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    CartLine,
    Session,
    RetiredSession,
    Product,
    Meta,
}

impl KeyPrefix {
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyPrefix::CartLine => "cart:",
            KeyPrefix::Session => "session:",
            KeyPrefix::RetiredSession => "session-retired:",
            KeyPrefix::Product => "product:",
            KeyPrefix::Meta => "meta:",
        }
    }

    /// Prefix of the whole family, for scans.
    pub fn family(self) -> Vec<u8> {
        self.as_str().as_bytes().to_vec()
    }

    /// Prefix of every cart line owned by `session`.
    pub fn cart_of(session: &SessionId) -> Vec<u8> {
        format!("{}{}:", Self::CartLine.as_str(), session.as_str()).into_bytes()
    }

    pub fn cart_line(session: &SessionId, product: ProductId) -> Vec<u8> {
        format!(
            "{}{}:{:020}",
            Self::CartLine.as_str(),
            session.as_str(),
            product.get()
        )
        .into_bytes()
    }

    pub fn session(session: &SessionId) -> Vec<u8> {
        format!("{}{}", Self::Session.as_str(), session.as_str()).into_bytes()
    }

    pub fn retired_session(session: &SessionId) -> Vec<u8> {
        format!("{}{}", Self::RetiredSession.as_str(), session.as_str()).into_bytes()
    }

    pub fn product(product: ProductId) -> Vec<u8> {
        format!("{}{:020}", Self::Product.as_str(), product.get()).into_bytes()
    }

    pub fn meta(name: &str) -> Vec<u8> {
        format!("{}{}", Self::Meta.as_str(), name).into_bytes()
    }
}

// =============================================================================
// IN-MEMORY ADAPTER
// =============================================================================

/// In-memory key-value store.
///
/// Ordered map under a single lock; `transact` holds the write lock for the
/// whole read-then-apply cycle. The availability switch lets tests simulate
/// an unreachable store.
pub struct InMemoryKVStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    available: AtomicBool,
}

impl Default for InMemoryKVStore {
    fn default() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the store off (`false`) or back on.
    pub fn set_available(&self, available: bool) {
        if !available {
            tracing::warn!("[storage] in-memory store switched to unavailable");
        }
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn check_available(&self) -> Result<(), KVStoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KVStoreError::Unavailable {
                message: "in-memory store switched off".to_string(),
            })
        }
    }

    fn apply(map: &mut BTreeMap<Vec<u8>, Vec<u8>>, operations: Vec<BatchOperation>) {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
    }
}

struct MapView<'a>(&'a BTreeMap<Vec<u8>, Vec<u8>>);

impl KeyValueRead for MapView<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.0.get(key).cloned())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(self
            .0
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.check_available()?;
        MapView(&self.data.read()).get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.check_available()?;
        MapView(&self.data.read()).prefix_scan(prefix)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.check_available()?;
        Self::apply(&mut self.data.write(), operations);
        Ok(())
    }

    fn transact(&self, body: &mut TransactionBody<'_>) -> Result<(), KVStoreError> {
        self.check_available()?;
        let mut guard = self.data.write();
        let operations = body(&MapView(&guard))?;
        Self::apply(&mut guard, operations);
        Ok(())
    }
}
