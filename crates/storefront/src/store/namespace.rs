//! Key-prefixing backend adapter.

use super::{SnapshotBackend, StoreError};

/// Wraps a backend so every key is stored as `<namespace>/<key>`.
///
/// The storefront gives each browser device its own namespace on a shared
/// backend, mirroring how a browser keeps its own local storage.
#[derive(Debug, Clone)]
pub struct Namespaced<B> {
    inner: B,
    prefix: String,
}

impl<B: SnapshotBackend> Namespaced<B> {
    /// Scope `inner` under `namespace`.
    #[must_use]
    pub fn new(inner: B, namespace: &str) -> Self {
        Self {
            inner,
            prefix: format!("{namespace}/"),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl<B: SnapshotBackend> SnapshotBackend for Namespaced<B> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(&self.full_key(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.write(&self.full_key(key), value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(&self.full_key(key))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_owned))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryBackend;

    #[test]
    fn test_namespaces_are_isolated() {
        let shared = Arc::new(MemoryBackend::default());
        let left = Namespaced::new(Arc::clone(&shared), "device/a");
        let right = Namespaced::new(Arc::clone(&shared), "device/b");

        left.write("cart:anonymous", "[\"left\"]").unwrap();
        assert_eq!(right.read("cart:anonymous").unwrap(), None);
        assert_eq!(left.keys().unwrap(), vec!["cart:anonymous".to_string()]);
        assert_eq!(
            shared.keys().unwrap(),
            vec!["device/a/cart:anonymous".to_string()]
        );
    }
}
