//! Persisted collection store.
//!
//! Snapshots of carts, wishlists and order history are kept as JSON documents
//! in a key-value [`SnapshotBackend`], addressed by [`ScopeKey`].
//!
//! [`CollectionStore`] is the typed layer on top of a backend. It never fails
//! towards its caller:
//!
//! - `load` returns the collection's `Default` when the key is absent, when the
//!   backend cannot be read, or when the stored document does not deserialize.
//!   Corrupt documents are deleted so they are not re-read on every load.
//! - `save` writes synchronously and logs failures at `warn`.
//!
//! # Backends
//!
//! - [`MemoryBackend`] - process-local map, used by default and in tests
//! - [`FileBackend`] - one JSON file per key under a data directory
//! - [`Namespaced`] - prefixes keys so one backend can hold many devices

mod file;
mod memory;
mod namespace;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use marigold_core::ScopeKey;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use namespace::Namespaced;

/// Errors raised by snapshot backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-memory snapshots was poisoned by a panicking writer.
    #[error("snapshot store lock poisoned")]
    Poisoned,
}

/// Raw key-value storage for serialized snapshots.
///
/// Implementations must be cheap to call from request handlers: every cart or
/// wishlist mutation results in exactly one `write`.
pub trait SnapshotBackend: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the document stored under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently stored, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be listed.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<B: SnapshotBackend + ?Sized> SnapshotBackend for Arc<B> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// Typed, fail-open access to persisted collections.
///
/// Cheaply cloneable; clones share the same backend.
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn SnapshotBackend>,
}

impl CollectionStore {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: impl SnapshotBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap a backend that is already shared elsewhere.
    #[must_use]
    pub fn from_shared(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self { backend }
    }

    /// A store backed by a fresh [`MemoryBackend`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Load the collection stored under `key`, or an empty one.
    #[must_use]
    pub fn load<T>(&self, key: &ScopeKey) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw_key = key.to_string();
        let raw = match self.backend.read(&raw_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key = %raw_key, error = %e, "Failed to read snapshot, starting empty");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %raw_key, error = %e, "Discarding corrupt snapshot");
                if let Err(e) = self.backend.delete(&raw_key) {
                    warn!(key = %raw_key, error = %e, "Failed to delete corrupt snapshot");
                }
                T::default()
            }
        }
    }

    /// Overwrite the snapshot under `key`. Failures are logged, never returned.
    pub fn save<T>(&self, key: &ScopeKey, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let raw_key = key.to_string();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %raw_key, error = %e, "Failed to serialize snapshot");
                return;
            }
        };

        match self.backend.write(&raw_key, &raw) {
            Ok(()) => debug!(key = %raw_key, bytes = raw.len(), "Snapshot saved"),
            Err(e) => warn!(key = %raw_key, error = %e, "Failed to save snapshot"),
        }
    }

    /// Delete the snapshot under `key`. Failures are logged, never returned.
    pub fn discard(&self, key: &ScopeKey) {
        let raw_key = key.to_string();
        if let Err(e) = self.backend.delete(&raw_key) {
            warn!(key = %raw_key, error = %e, "Failed to discard snapshot");
        }
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore").finish_non_exhaustive()
    }
}
