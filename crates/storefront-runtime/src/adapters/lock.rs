//! # Data Directory Lock
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows). Two storefront processes must never open the same RocksDB
//! directory.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Errors from data directory locking
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to create lock file {}: {source}", .path.display())]
    CreateFailed { path: PathBuf, source: io::Error },

    #[error("data directory already in use ({}), held by pid {:?}", .path.display(), .pid)]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    #[error("failed to write PID to lock file: {0}")]
    WriteFailed(io::Error),
}

/// Exclusive lock on a data directory, released on drop.
pub struct DatabaseLock {
    /// Kept open to hold the lock
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DatabaseLock {
    const LOCK_FILE: &'static str = "storefront.lock";

    /// Acquire the lock without waiting. The directory is created if missing.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        let path = data_dir.join(Self::LOCK_FILE);
        std::fs::create_dir_all(data_dir).map_err(|source| LockError::CreateFailed {
            path: path.clone(),
            source,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::CreateFailed {
                path: path.clone(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::AlreadyLocked {
                pid: Self::read_existing_pid(&path),
                path,
            });
        }

        let pid = std::process::id();
        file.set_len(0).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", pid).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        tracing::debug!(path = %path.display(), pid, "[storage] data directory locked");
        Ok(Self { file, path, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
