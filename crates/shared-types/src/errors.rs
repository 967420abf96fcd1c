//! # Error Types
//!
//! The storefront error taxonomy plus the durable-store error shared by all
//! subsystems.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Error categories every subsystem error maps into.
///
/// The gateway turns these into response statuses; nothing else inspects
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range caller data. User-recoverable.
    InvalidInput,
    /// Referenced product (or other entity) does not exist.
    NotFound,
    /// Forgery token missing, stale or wrong. No mutation was performed.
    ForgeryTokenMismatch,
    /// Durable store unreachable or failing. Fails closed; safe to retry later.
    StorageUnavailable,
}

/// Errors raised by a [`crate::KeyValueStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// Store cannot be reached (closed, disconnected, switched off).
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Underlying engine reported an I/O failure.
    #[error("store I/O error: {message}")]
    IOError { message: String },

    /// A persisted record could not be encoded or decoded.
    #[error("record serialization error: {message}")]
    Serialization { message: String },
}

impl KVStoreError {
    /// Every store failure is an infrastructure failure.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StorageUnavailable
    }
}

// =============================================================================
// FIELD VALIDATION REPORT
// =============================================================================

/// Validation complaints keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Record a complaint; a later complaint about the same field replaces
    /// the earlier one.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}
