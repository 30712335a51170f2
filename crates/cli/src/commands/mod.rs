//! Command implementations.

pub mod carts;
pub mod snapshots;

use std::path::Path;
use std::sync::Arc;

use marigold_storefront::store::{FileBackend, SnapshotBackend, StoreError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The data directory does not exist.
    #[error("Data directory not found: {0}")]
    MissingDataDir(String),

    /// Reading or writing snapshots failed.
    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// A snapshot exists but does not parse.
    #[error("Snapshot {key} is corrupt: {source}")]
    CorruptSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// No snapshot is stored under the key.
    #[error("No snapshot stored under {0}")]
    MissingSnapshot(String),
}

/// Open an existing data directory.
///
/// Unlike the storefront, the CLI never creates the directory: a typo in the
/// path should fail rather than show an empty store.
pub fn open(data_dir: &Path) -> Result<Arc<dyn SnapshotBackend>, CliError> {
    if !data_dir.is_dir() {
        return Err(CliError::MissingDataDir(data_dir.display().to_string()));
    }
    Ok(Arc::new(FileBackend::open(data_dir)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(open(&missing), Err(CliError::MissingDataDir(_))));
        assert!(!missing.exists());
    }

    #[test]
    fn test_open_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = open(dir.path()).unwrap();
        backend.write("cart:anonymous", "[]").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["cart:anonymous".to_string()]);
    }
}
