//! Per-browser device sessions.
//!
//! Each browser talking to the storefront is a *device*. A device owns one
//! [`ShopSession`] whose snapshots live in its own namespace of the shared
//! backend, plus the identity provider and notification queue that session
//! listens to. Devices are kept in a `moka` cache and evicted after a period
//! of inactivity; the snapshots outlive them.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use marigold_core::{DeviceId, UserId};

use crate::identity::{IdentityHub, Subscription, spawn_identity_listener};
use crate::notify::{Notification, NotificationQueue};
use crate::session::{SharedSession, ShopSession};
use crate::store::{CollectionStore, Namespaced, SnapshotBackend};

/// Upper bound on devices held in memory at once.
const MAX_DEVICES: u64 = 100_000;

/// One browser's live session.
pub struct Device {
    id: DeviceId,
    session: SharedSession,
    identity: IdentityHub,
    notifications: NotificationQueue,
    _subscription: Subscription,
}

impl Device {
    /// Open the device `id` on `backend`, signed in as `user` if known.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn open(id: DeviceId, backend: Arc<dyn SnapshotBackend>, user: Option<UserId>) -> Self {
        let store = CollectionStore::new(Namespaced::new(backend, &namespace(id)));
        let notifications = NotificationQueue::new();
        let session = ShopSession::new(store, Arc::new(notifications.clone()), None).shared();

        let identity = IdentityHub::new();
        if let Some(user) = user {
            identity.sign_in(user);
        }
        let subscription = spawn_identity_listener(Arc::clone(&session), identity.clone());

        tracing::debug!(device_id = %id, "Device opened");
        Self {
            id,
            session,
            identity,
            notifications,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    #[must_use]
    pub const fn session(&self) -> &SharedSession {
        &self.session
    }

    /// The identity provider this device's session follows.
    #[must_use]
    pub const fn identity(&self) -> &IdentityHub {
        &self.identity
    }

    /// Take the notifications raised since the last call.
    #[must_use]
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.notifications.drain()
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Backend namespace holding a device's snapshots.
#[must_use]
pub fn namespace(id: DeviceId) -> String {
    format!("device/{id}")
}

/// Live devices keyed by id.
#[derive(Clone)]
pub struct DeviceRegistry {
    backend: Arc<dyn SnapshotBackend>,
    devices: Cache<DeviceId, Arc<Device>>,
}

impl DeviceRegistry {
    /// Create a registry over `backend`, evicting devices idle for `idle`.
    #[must_use]
    pub fn new(backend: Arc<dyn SnapshotBackend>, idle: Duration) -> Self {
        let devices = Cache::builder()
            .max_capacity(MAX_DEVICES)
            .time_to_idle(idle)
            .eviction_listener(|id: Arc<DeviceId>, _device, cause| {
                tracing::debug!(device_id = %id, ?cause, "Device evicted");
            })
            .build();

        Self { backend, devices }
    }

    /// Get the device `id`, opening it if it is not live.
    ///
    /// `user` seeds the identity of a newly opened device; it is ignored for a
    /// device that is already live.
    pub async fn device(&self, id: DeviceId, user: Option<UserId>) -> Arc<Device> {
        let backend = Arc::clone(&self.backend);
        self.devices
            .get_with(id, async move { Arc::new(Device::open(id, backend, user)) })
            .await
    }

    /// Number of live devices (approximate).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.devices.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.devices.entry_count())
            .finish_non_exhaustive()
    }
}
