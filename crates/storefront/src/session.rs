//! The per-client shopping session.
//!
//! [`ShopSession`] is the service object that owns a client's cart and
//! wishlist and moves them between identity scopes as the client signs in and
//! out. It is constructed explicitly from its collaborators; there is no
//! ambient or global session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use marigold_core::{Identity, ScopeKey, UserId};

use crate::cart::{Cart, CartManager};
use crate::checkout::{Order, SavedAddress};
use crate::identity::IdentityEvent;
use crate::notify::{Notification, NotificationSink};
use crate::reconcile::{MergeKind, reconcile};
use crate::store::CollectionStore;
use crate::wishlist::{Wishlist, WishlistManager};

/// A session shared between request handlers and the identity listener.
pub type SharedSession = Arc<Mutex<ShopSession>>;

/// Lock a shared session.
///
/// Session state is always left consistent between statements, so a lock
/// poisoned by a panicking holder is recovered rather than propagated.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, ShopSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What applying an identity did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTransition {
    Unchanged,
    SignedIn { user: UserId, merge: MergeKind },
    SignedOut,
}

/// One client's cart, wishlist and identity.
pub struct ShopSession {
    cart: CartManager,
    wishlist: WishlistManager,
    store: CollectionStore,
    notifier: Arc<dyn NotificationSink>,
}

impl ShopSession {
    /// Open a session for `current_user`, loading that scope's snapshots.
    #[must_use]
    pub fn new(
        store: CollectionStore,
        notifier: Arc<dyn NotificationSink>,
        current_user: Option<UserId>,
    ) -> Self {
        let identity = Identity::from_user(current_user);
        Self {
            cart: CartManager::load(store.clone(), Arc::clone(&notifier), identity),
            wishlist: WishlistManager::load(store.clone(), Arc::clone(&notifier), identity),
            store,
            notifier,
        }
    }

    /// Wrap the session for sharing with an identity listener.
    #[must_use]
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.cart.identity()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartManager {
        &mut self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistManager {
        &self.wishlist
    }

    pub const fn wishlist_mut(&mut self) -> &mut WishlistManager {
        &mut self.wishlist
    }

    pub(crate) const fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn NotificationSink> {
        &self.notifier
    }

    /// Apply an event from the identity provider.
    pub fn handle_identity_event(&mut self, event: IdentityEvent) -> IdentityTransition {
        self.apply_identity(event.user())
    }

    /// Move the session to the identity of `user`.
    ///
    /// Re-applying the current identity does nothing. Switching directly
    /// between two users is a sign-out followed by a sign-in.
    pub fn apply_identity(&mut self, user: Option<UserId>) -> IdentityTransition {
        match (self.identity(), Identity::from_user(user)) {
            (current, target) if current == target => IdentityTransition::Unchanged,
            (Identity::Anonymous, Identity::Authenticated(user)) => self.sign_in(user),
            (Identity::Authenticated(_), Identity::Anonymous) => self.sign_out(true),
            (Identity::Authenticated(_), Identity::Authenticated(user)) => {
                // The previous user's wishlist must not be merged into the next one.
                self.sign_out(false);
                self.sign_in(user)
            }
            (Identity::Anonymous, Identity::Anonymous) => IdentityTransition::Unchanged,
        }
    }

    fn sign_in(&mut self, user: UserId) -> IdentityTransition {
        let scope = Identity::Authenticated(user);
        let guest_cart = self.cart.cart().clone();
        let guest_wishlist = self.wishlist.wishlist().clone();
        let saved_cart: Cart = self.store.load(&ScopeKey::Cart(scope));
        let saved_wishlist: Wishlist = self.store.load(&ScopeKey::Wishlist(scope));

        let merged = reconcile(user, guest_cart, saved_cart, guest_wishlist, saved_wishlist);
        self.cart.replace(scope, merged.cart);
        self.wishlist.replace(scope, merged.wishlist);

        // The guest scope has been folded into the user's; empty it so a replayed
        // or later sign-in cannot count the same quantities twice.
        self.store
            .save(&ScopeKey::Cart(Identity::Anonymous), &Cart::new());
        self.store
            .save(&ScopeKey::Wishlist(Identity::Anonymous), &Wishlist::new());

        if merged.kind == MergeKind::Combined {
            self.notifier.notify(Notification::info(
                "Signed in - your cart has been synced",
            ));
        }

        IdentityTransition::SignedIn {
            user,
            merge: merged.kind,
        }
    }

    /// Clear the cart and return to the anonymous scope. The wishlist stays
    /// visible and is carried into the anonymous scope when `keep_wishlist`
    /// is set.
    fn sign_out(&mut self, keep_wishlist: bool) -> IdentityTransition {
        if let Some(user) = self.identity().user_id() {
            info!(user_id = %user, "Signing out session");
        }
        self.cart.reset(Identity::Anonymous);
        if keep_wishlist {
            self.wishlist.carry_to(Identity::Anonymous);
        } else {
            self.wishlist.replace(Identity::Anonymous, Wishlist::new());
        }
        IdentityTransition::SignedOut
    }

    /// Orders placed by the signed-in user, newest first.
    #[must_use]
    pub fn order_history(&self) -> Vec<Order> {
        match self.identity() {
            Identity::Authenticated(user) => {
                let mut orders: Vec<Order> = self.store.load(&ScopeKey::Orders(user));
                orders.reverse();
                orders
            }
            Identity::Anonymous => Vec::new(),
        }
    }

    /// Addresses saved by the signed-in user, default (most recent) first.
    #[must_use]
    pub fn saved_addresses(&self) -> Vec<SavedAddress> {
        match self.identity() {
            Identity::Authenticated(user) => {
                let mut addresses: Vec<SavedAddress> =
                    self.store.load(&ScopeKey::Addresses(user));
                addresses.reverse();
                addresses
            }
            Identity::Anonymous => Vec::new(),
        }
    }
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .finish_non_exhaustive()
    }
}
