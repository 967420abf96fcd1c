//! Error types for the Cart Consistency Service

use crate::domain::FieldErrors;
use sf_03_cart_store::CartStoreError;
use shared_types::{ErrorKind, KVStoreError, ProductId};
use thiserror::Error;

/// Cart service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// One or more fields are malformed or out of range.
    #[error("Invalid cart input: {0}")]
    InvalidInput(FieldErrors),

    /// The catalog has no such product.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Cart store failure.
    #[error(transparent)]
    Store(#[from] CartStoreError),

    /// Catalog lookup failure.
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] KVStoreError),
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::InvalidInput(_) => ErrorKind::InvalidInput,
            CartError::ProductNotFound { .. } => ErrorKind::NotFound,
            CartError::Store(err) => err.kind(),
            CartError::Catalog(err) => err.kind(),
        }
    }

    /// Field report for `InvalidInput`.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CartError::InvalidInput(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for cart service operations
pub type CartResult<T> = Result<T, CartError>;
