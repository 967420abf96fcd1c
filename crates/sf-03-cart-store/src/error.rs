//! Error types for the Cart Store

use shared_types::{ErrorKind, KVStoreError};
use thiserror::Error;

/// Cart store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartStoreError {
    /// Durable store or catalog lookup failed.
    #[error("Cart storage unavailable: {0}")]
    Storage(#[from] KVStoreError),
}

impl CartStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartStoreError::Storage(err) => err.kind(),
        }
    }
}

/// Result type for cart store operations
pub type CartStoreResult<T> = Result<T, CartStoreError>;
