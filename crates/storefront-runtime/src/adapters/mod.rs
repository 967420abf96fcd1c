//! Runtime adapters: the durable store and its process lock.

pub mod lock;
pub mod storage;

pub use lock::{DatabaseLock, LockError};
pub use storage::{RocksDbConfig, RocksDbStore};
