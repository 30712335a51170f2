//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::devices::DeviceRegistry;
use crate::store::{FileBackend, MemoryBackend, SnapshotBackend, StoreError};

/// Errors building application state at startup.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open snapshot store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the snapshot backend, live devices, the catalog and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn SnapshotBackend>,
    devices: DeviceRegistry,
    catalog: Catalog,
}

impl AppState {
    /// Create application state over an existing backend, serving the
    /// built-in catalog.
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Arc<dyn SnapshotBackend>) -> Self {
        Self::with_catalog(config, backend, Catalog::builtin())
    }

    /// Create application state over an existing backend and catalog.
    #[must_use]
    pub fn with_catalog(
        config: StorefrontConfig,
        backend: Arc<dyn SnapshotBackend>,
        catalog: Catalog,
    ) -> Self {
        let devices = DeviceRegistry::new(Arc::clone(&backend), config.device_idle);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                devices,
                catalog,
            }),
        }
    }

    /// Create application state with the backend the configuration asks for:
    /// files under `data_dir` when set, memory otherwise. The catalog is read
    /// from `catalog_path` when set.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the data directory cannot be created or the
    /// catalog file cannot be loaded.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let backend: Arc<dyn SnapshotBackend> = match &config.data_dir {
            Some(dir) => Arc::new(FileBackend::open(dir)?),
            None => Arc::new(MemoryBackend::default()),
        };
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin(),
        };
        Ok(Self::with_catalog(config, backend, catalog))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared snapshot backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn SnapshotBackend> {
        &self.inner.backend
    }

    /// Get a reference to the live device registry.
    #[must_use]
    pub fn devices(&self) -> &DeviceRegistry {
        &self.inner.devices
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
