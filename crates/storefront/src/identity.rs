//! Identity provider seam and the sign-in/sign-out event subscription.
//!
//! Authentication itself is delegated to an external provider. The storefront
//! only needs two things from it: who is signed in right now, and a stream of
//! transitions. [`IdentityHub`] is the in-process provider used by the HTTP
//! layer; anything implementing [`IdentityService`] can stand in for it.
//!
//! Events are delivered on a later task turn than the action that caused them
//! and may be delivered more than once. [`ShopSession::apply_identity`] is a
//! no-op when the identity has not changed, so replays are harmless.
//!
//! [`ShopSession::apply_identity`]: crate::session::ShopSession::apply_identity

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use marigold_core::UserId;

use crate::session::{SharedSession, lock_session};

/// Buffered events per subscriber before it is considered lagged.
const EVENT_BUFFER: usize = 16;

/// A transition reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(UserId),
    SignedOut,
}

impl IdentityEvent {
    /// The user signed in after this event, if any.
    #[must_use]
    pub const fn user(&self) -> Option<UserId> {
        match self {
            Self::SignedIn(user) => Some(*user),
            Self::SignedOut => None,
        }
    }
}

/// The external identity provider as seen by the storefront.
pub trait IdentityService: Send + Sync {
    /// The currently signed-in user.
    fn current_user(&self) -> Option<UserId>;

    /// Subscribe to future identity transitions.
    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}

/// In-process identity provider.
///
/// Cheaply cloneable; clones observe the same state.
#[derive(Debug, Clone)]
pub struct IdentityHub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
struct HubInner {
    current: RwLock<Option<UserId>>,
    events: broadcast::Sender<IdentityEvent>,
}

impl IdentityHub {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(HubInner {
                current: RwLock::new(None),
                events,
            }),
        }
    }

    /// Record `user` as signed in and notify subscribers.
    pub fn sign_in(&self, user: UserId) {
        self.set(Some(user));
        self.publish(IdentityEvent::SignedIn(user));
    }

    /// Record that nobody is signed in and notify subscribers.
    pub fn sign_out(&self) {
        self.set(None);
        self.publish(IdentityEvent::SignedOut);
    }

    fn set(&self, user: Option<UserId>) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user;
    }

    fn publish(&self, event: IdentityEvent) {
        // No subscribers is fine: the next subscriber reads `current_user`.
        if self.inner.events.send(event).is_err() {
            debug!(?event, "Identity event published with no subscribers");
        }
    }
}

impl Default for IdentityHub {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityService for IdentityHub {
    fn current_user(&self) -> Option<UserId> {
        *self
            .inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.inner.events.subscribe()
    }
}

/// Handle to a running identity listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Whether the listener task has stopped (provider closed or aborted).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe `session` to `service` and keep it in step with the provider.
///
/// The session is first brought up to date with the provider's current user,
/// then every subsequent event is applied on a background task. A subscriber
/// that falls behind resynchronizes from `current_user` instead of replaying
/// the missed events.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_identity_listener<S>(session: SharedSession, service: S) -> Subscription
where
    S: IdentityService + 'static,
{
    let mut events = service.subscribe();
    lock_session(&session).apply_identity(service.current_user());

    let task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "Identity event received");
                    lock_session(&session).handle_identity_event(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Identity listener lagged, resynchronizing");
                    lock_session(&session).apply_identity(service.current_user());
                }
                Err(RecvError::Closed) => {
                    debug!("Identity provider closed, listener stopping");
                    break;
                }
            }
        }
    });

    Subscription { task }
}
