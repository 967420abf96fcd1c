//! Runtime startup and maintenance errors.

use crate::adapters::LockError;
use sf_01_session_identity::SessionError;
use sf_03_cart_store::CartStoreError;
use sf_05_catalog::CatalogError;
use sf_06_api_gateway::ConfigError;
use shared_types::KVStoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("environment variable {name}: {message}")]
    Env { name: &'static str, message: String },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Storage(#[from] KVStoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    CartStore(#[from] CartStoreError),

    #[error("catalog seed entry {index}: {source}")]
    Seed { index: usize, source: CatalogError },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
