//! # RocksDB Storage Adapter
//!
//! Durable implementation of the [`KeyValueStore`] port.
//!
//! ## Features
//!
//! - Atomic batch writes (`WriteBatch`)
//! - Snappy compression
//! - Bloom filters for point lookups
//! - fsync on write, configurable
//!
//! ## Write Exclusion
//!
//! RocksDB itself is thread safe, but a read-modify-write cycle is not. Every
//! write path takes `write_lock`, so the view handed to a `transact` body
//! cannot change before its batch lands. Plain reads never take the lock.

use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use shared_types::{
    BatchOperation, KVStoreError, KeyValueRead, KeyValueStore, ScanResult, TransactionBody,
};
use std::path::{Path, PathBuf};

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/rocksdb"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (small buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store
pub struct RocksDbStore {
    db: DB,
    write_lock: Mutex<()>,
    sync_writes: bool,
}

impl RocksDbStore {
    /// Open or create a RocksDB database
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| KVStoreError::IOError {
            message: format!("Failed to open RocksDB at {}: {}", config.path.display(), e),
        })?;

        tracing::info!(
            path = %config.path.display(),
            sync_writes = config.sync_writes,
            "[storage] RocksDB opened"
        );

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            sync_writes: config.sync_writes,
        })
    }

    /// Open with default tuning at `path`
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, KVStoreError> {
        Self::open(RocksDbConfig {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        write_opts
    }

    /// Apply a batch. Caller holds `write_lock`.
    fn apply(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if operations.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }
}

fn read_key(db: &DB, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
    db.get(key).map_err(|e| KVStoreError::IOError {
        message: format!("RocksDB get failed: {}", e),
    })
}

fn scan_prefix(db: &DB, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
    let mut results = Vec::new();
    for item in db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
        let (key, value) = item.map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB iteration failed: {}", e),
        })?;
        if !key.starts_with(prefix) {
            break;
        }
        results.push((key.to_vec(), value.to_vec()));
    }
    Ok(results)
}

/// Read view handed to `transact` bodies.
struct DbView<'a>(&'a DB);

impl KeyValueRead for DbView<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        read_key(self.0, key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        scan_prefix(self.0, prefix)
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        read_key(&self.db, key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        scan_prefix(&self.db, prefix)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let _guard = self.write_lock.lock();
        self.apply(operations)
    }

    fn transact(&self, body: &mut TransactionBody<'_>) -> Result<(), KVStoreError> {
        let _guard = self.write_lock.lock();
        let operations = body(&DbView(&self.db))?;
        self.apply(operations)
    }
}
