//! Error types for the Forgery-Token Guard

use sf_01_session_identity::SessionError;
use shared_types::{ErrorKind, KVStoreError};
use thiserror::Error;

/// Forgery guard errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeryError {
    /// Candidate missing, stale, already consumed or wrong.
    #[error("Forgery token mismatch")]
    Mismatch,

    /// Session lookup or regeneration failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<KVStoreError> for ForgeryError {
    fn from(err: KVStoreError) -> Self {
        ForgeryError::Session(SessionError::Storage(err))
    }
}

impl ForgeryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForgeryError::Mismatch => ErrorKind::ForgeryTokenMismatch,
            ForgeryError::Session(err) => err.kind(),
        }
    }
}

/// Result type for forgery guard operations
pub type ForgeryResult<T> = Result<T, ForgeryError>;
