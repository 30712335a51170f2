//! Wishlist state.
//!
//! A wishlist is a set of products kept in the order they were saved.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use marigold_core::{Identity, ProductRef, ScopeKey};

use crate::cart::ProductSummary;
use crate::notify::{Notification, NotificationSink};
use crate::store::CollectionStore;

/// A saved product.
pub type WishlistItem = ProductSummary;

/// Ordered set of saved products. Duplicates are dropped when loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WishlistItem>", into = "Vec<WishlistItem>")]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: &ProductRef) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `item` unless a product with the same id is already saved.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, id: &ProductRef) -> Option<WishlistItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl From<Vec<WishlistItem>> for Wishlist {
    fn from(items: Vec<WishlistItem>) -> Self {
        let mut wishlist = Self::new();
        for item in items {
            wishlist.insert(item);
        }
        wishlist
    }
}

impl From<Wishlist> for Vec<WishlistItem> {
    fn from(wishlist: Wishlist) -> Self {
        wishlist.items
    }
}

/// What a wishlist mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    AlreadyPresent,
    Removed,
    Cleared,
    Unchanged,
}

/// The active wishlist of one session, persisted under `wishlist:<identity>`.
pub struct WishlistManager {
    identity: Identity,
    wishlist: Wishlist,
    store: CollectionStore,
    notifier: Arc<dyn NotificationSink>,
}

impl WishlistManager {
    /// Load the wishlist persisted for `identity`, or start empty.
    #[must_use]
    pub fn load(
        store: CollectionStore,
        notifier: Arc<dyn NotificationSink>,
        identity: Identity,
    ) -> Self {
        let wishlist = store.load(&ScopeKey::Wishlist(identity));
        Self {
            identity,
            wishlist,
            store,
            notifier,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductRef) -> bool {
        self.wishlist.contains(id)
    }

    pub fn add_to_wishlist(&mut self, item: WishlistItem) -> WishlistChange {
        let name = item.name.clone();
        if !self.wishlist.insert(item) {
            self.notifier.notify(Notification::info(format!(
                "{name} is already in your wishlist"
            )));
            return WishlistChange::AlreadyPresent;
        }
        self.persist();
        self.notifier
            .notify(Notification::success(format!("{name} added to wishlist")));
        WishlistChange::Added
    }

    pub fn remove_from_wishlist(&mut self, id: &ProductRef) -> WishlistChange {
        match self.wishlist.remove(id) {
            Some(item) => {
                self.persist();
                self.notifier.notify(Notification::info(format!(
                    "{} removed from wishlist",
                    item.name
                )));
                WishlistChange::Removed
            }
            None => WishlistChange::Unchanged,
        }
    }

    /// Remove `item` if it is saved, save it otherwise (the heart button).
    pub fn toggle(&mut self, item: WishlistItem) -> WishlistChange {
        if self.is_in_wishlist(&item.id) {
            self.remove_from_wishlist(&item.id)
        } else {
            self.add_to_wishlist(item)
        }
    }

    pub fn clear_wishlist(&mut self) -> WishlistChange {
        self.wishlist.clear();
        self.persist();
        self.notifier.notify(Notification::info("Wishlist cleared"));
        WishlistChange::Cleared
    }

    /// Switch to `identity` with `wishlist` as its contents and persist it there.
    pub(crate) fn replace(&mut self, identity: Identity, wishlist: Wishlist) {
        self.identity = identity;
        self.wishlist = wishlist;
        self.persist();
    }

    /// Move the current items to `identity` and persist them there.
    pub(crate) fn carry_to(&mut self, identity: Identity) {
        self.identity = identity;
        self.persist();
    }

    fn persist(&self) {
        debug!(
            identity = %self.identity,
            items = self.wishlist.len(),
            "Persisting wishlist"
        );
        self.store
            .save(&ScopeKey::Wishlist(self.identity), &self.wishlist);
    }
}

impl std::fmt::Debug for WishlistManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistManager")
            .field("identity", &self.identity)
            .field("wishlist", &self.wishlist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::product;
    use crate::notify::{NotificationQueue, Severity};

    fn manager() -> (WishlistManager, NotificationQueue, CollectionStore) {
        let store = CollectionStore::in_memory();
        let queue = NotificationQueue::new();
        let manager =
            WishlistManager::load(store.clone(), Arc::new(queue.clone()), Identity::Anonymous);
        (manager, queue, store)
    }

    #[test]
    fn test_membership_tracks_adds_and_removes() {
        let (mut manager, _queue, _store) = manager();
        manager.add_to_wishlist(product("a", 100));
        manager.add_to_wishlist(product("b", 100));
        manager.remove_from_wishlist(&"a".into());

        assert!(!manager.is_in_wishlist(&"a".into()));
        assert!(manager.is_in_wishlist(&"b".into()));
        assert!(!manager.is_in_wishlist(&"c".into()));
    }

    #[test]
    fn test_duplicate_add_keeps_size() {
        let (mut manager, queue, _store) = manager();
        assert_eq!(manager.add_to_wishlist(product("a", 100)), WishlistChange::Added);
        assert_eq!(
            manager.add_to_wishlist(product("a", 100)),
            WishlistChange::AlreadyPresent
        );
        assert_eq!(manager.wishlist().len(), 1);

        let last = queue.drain().pop().unwrap();
        assert_eq!(last.severity, Severity::Info);
        assert_eq!(last.message, "Product a is already in your wishlist");
    }

    #[test]
    fn test_remove_missing_is_silent() {
        let (mut manager, queue, _store) = manager();
        assert_eq!(
            manager.remove_from_wishlist(&"nope".into()),
            WishlistChange::Unchanged
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_toggle() {
        let (mut manager, _queue, _store) = manager();
        assert_eq!(manager.toggle(product("a", 100)), WishlistChange::Added);
        assert_eq!(manager.toggle(product("a", 100)), WishlistChange::Removed);
        assert!(manager.wishlist().is_empty());
    }

    #[test]
    fn test_changes_are_persisted() {
        let (mut manager, _queue, store) = manager();
        manager.add_to_wishlist(product("a", 100));
        manager.add_to_wishlist(product("b", 100));
        manager.clear_wishlist();
        manager.add_to_wishlist(product("c", 100));

        let stored: Wishlist = store.load(&ScopeKey::Wishlist(Identity::Anonymous));
        assert_eq!(&stored, manager.wishlist());
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_snapshot_drops_duplicates() {
        let item = product("a", 100);
        let json = serde_json::to_string(&vec![item.clone(), item]).unwrap();
        let wishlist: Wishlist = serde_json::from_str(&json).unwrap();
        assert_eq!(wishlist.len(), 1);
    }
}
