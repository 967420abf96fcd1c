//! Error types for the Catalog subsystem

use shared_types::{ErrorKind, FieldErrors, KVStoreError};
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Product fields failed validation.
    #[error("Invalid product data: {0}")]
    InvalidInput(FieldErrors),

    /// Identifier is not a positive integer.
    #[error("Invalid product ID: {id}")]
    InvalidId { id: i64 },

    /// Durable store failure.
    #[error("Catalog storage unavailable: {0}")]
    Storage(#[from] KVStoreError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::InvalidInput(_) | CatalogError::InvalidId { .. } => {
                ErrorKind::InvalidInput
            }
            CatalogError::Storage(err) => err.kind(),
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
