//! In-process snapshot backend.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{SnapshotBackend, StoreError};

/// Snapshot backend holding documents in a process-local map.
///
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_overwrites() {
        let backend = MemoryBackend::default();
        backend.write("cart:anonymous", "[]").unwrap();
        backend.write("cart:anonymous", "[1]").unwrap();
        assert_eq!(backend.read("cart:anonymous").unwrap().as_deref(), Some("[1]"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let backend = MemoryBackend::default();
        assert!(backend.delete("wishlist:anonymous").is_ok());
        assert!(backend.is_empty());
    }
}
