//! Error types for the Session Identity subsystem

use shared_types::{ErrorKind, KVStoreError};
use thiserror::Error;

/// Session subsystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No live session with this identifier.
    #[error("Session not found or expired: {session}")]
    NotFound { session: String },

    /// Could not draw an unused identifier.
    #[error("Failed to allocate an unused session identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: usize },

    /// Durable store failure. Fails closed.
    #[error("Session storage unavailable: {0}")]
    Storage(#[from] KVStoreError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NotFound { .. } => ErrorKind::NotFound,
            SessionError::IdentifierExhausted { .. } | SessionError::Storage(_) => {
                ErrorKind::StorageUnavailable
            }
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
