//! Shopping cart state.
//!
//! [`Cart`] is the plain value: an ordered list of [`LineItem`]s, unique by
//! product, every quantity at least one. [`CartManager`] owns the active cart
//! for one identity, persists it after every change and reports changes to the
//! user through a [`NotificationSink`].
//!
//! Totals are never stored. `total_items` and `subtotal` are recomputed from the
//! line items on every call, and snapshots only contain the lines.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use marigold_core::{Identity, Price, ProductRef, ScopeKey};

use crate::notify::{Notification, NotificationSink};
use crate::store::CollectionStore;

/// Free-form options chosen on the product page (size, engraving, ...).
pub type Customizations = BTreeMap<String, serde_json::Value>;

/// Catalog data needed to show a product in the cart or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductRef,
    pub name: String,
    pub unit_price: Price,
    pub image: String,
}

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub customizations: Customizations,
}

impl LineItem {
    #[must_use]
    pub const fn id(&self) -> &ProductRef {
        &self.product.id
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.unit_price.line_total(self.quantity)
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added,
    /// An existing line's quantity grew to `quantity`.
    Incremented { quantity: u32 },
    /// A line's quantity was set.
    Updated,
    /// A line was removed.
    Removed(LineItem),
    /// Every line was removed.
    Cleared,
    /// The call was a no-op.
    Unchanged,
}

/// Ordered collection of line items. Insertion order is display order.
///
/// Snapshots are plain JSON arrays of line items. Loading a snapshot drops
/// lines with a zero quantity and folds duplicate products into one line, so a
/// hand-edited snapshot cannot break the cart's invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &ProductRef) -> Option<&LineItem> {
        self.items.iter().find(|line| line.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ProductRef) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line keeps its position and product data; its quantity
    /// grows and its customizations are replaced by the new ones. A new
    /// product is appended. Adding zero units is a no-op.
    pub fn add(
        &mut self,
        product: ProductSummary,
        quantity: u32,
        customizations: Customizations,
    ) -> CartChange {
        if quantity == 0 {
            return CartChange::Unchanged;
        }

        if let Some(line) = self.items.iter_mut().find(|line| line.id() == &product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.customizations = customizations;
            return CartChange::Incremented {
                quantity: line.quantity,
            };
        }

        self.items.push(LineItem {
            product,
            quantity,
            customizations,
        });
        CartChange::Added
    }

    /// Remove the line for `id`, returning it if it was present.
    pub fn remove(&mut self, id: &ProductRef) -> Option<LineItem> {
        let index = self.items.iter().position(|line| line.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Quantities below one are ignored rather than treated as removal.
    /// Returns whether a line was changed.
    pub fn update_quantity(&mut self, id: &ProductRef, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }
        match self.items.iter_mut().find(|line| line.id() == id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Fold `line` into the cart: quantities add up for a product already
    /// present, otherwise the line is appended.
    pub(crate) fn absorb(&mut self, line: LineItem) {
        let LineItem {
            product,
            quantity,
            customizations,
        } = line;
        self.add(product, quantity, customizations);
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(lines: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.absorb(line);
        }
        cart
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// The active cart of one session.
///
/// Every change is written to the store under `cart:<identity>` before the
/// method returns. Calls that change nothing do not write.
pub struct CartManager {
    identity: Identity,
    cart: Cart,
    store: CollectionStore,
    notifier: Arc<dyn NotificationSink>,
}

impl CartManager {
    /// Load the cart persisted for `identity`, or start empty.
    #[must_use]
    pub fn load(
        store: CollectionStore,
        notifier: Arc<dyn NotificationSink>,
        identity: Identity,
    ) -> Self {
        let cart = store.load(&ScopeKey::Cart(identity));
        Self {
            identity,
            cart,
            store,
            notifier,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    /// Add one unit of `product` with no customizations.
    pub fn add_to_cart(&mut self, product: ProductSummary) -> CartChange {
        self.add_to_cart_with(product, 1, Customizations::new())
    }

    /// Add `quantity` units of `product`, replacing any earlier customizations.
    pub fn add_to_cart_with(
        &mut self,
        product: ProductSummary,
        quantity: u32,
        customizations: Customizations,
    ) -> CartChange {
        let name = product.name.clone();
        let change = self.cart.add(product, quantity, customizations);
        if change != CartChange::Unchanged {
            self.persist();
            self.notifier
                .notify(Notification::success(format!("{name} added to cart")));
        }
        change
    }

    /// Remove the line for `id`. Missing products are ignored.
    pub fn remove_from_cart(&mut self, id: &ProductRef) -> CartChange {
        match self.cart.remove(id) {
            Some(line) => {
                self.persist();
                self.notifier.notify(Notification::info(format!(
                    "{} removed from cart",
                    line.product.name
                )));
                CartChange::Removed(line)
            }
            None => CartChange::Unchanged,
        }
    }

    /// Set a line's quantity. Quantities below one and unknown products are ignored.
    pub fn update_quantity(&mut self, id: &ProductRef, quantity: u32) -> CartChange {
        if self.cart.update_quantity(id, quantity) {
            self.persist();
            CartChange::Updated
        } else {
            CartChange::Unchanged
        }
    }

    /// Empty the cart unconditionally.
    pub fn clear_cart(&mut self) -> CartChange {
        self.cart.clear();
        self.persist();
        self.notifier.notify(Notification::info("Cart cleared"));
        CartChange::Cleared
    }

    /// Switch to `identity` with `cart` as its contents and persist it there.
    pub(crate) fn replace(&mut self, identity: Identity, cart: Cart) {
        self.identity = identity;
        self.cart = cart;
        self.persist();
    }

    /// Empty the cart without telling the user.
    pub(crate) fn reset(&mut self, identity: Identity) {
        self.replace(identity, Cart::new());
    }

    fn persist(&self) {
        debug!(
            identity = %self.identity,
            lines = self.cart.len(),
            "Persisting cart"
        );
        self.store.save(&ScopeKey::Cart(self.identity), &self.cart);
    }
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("identity", &self.identity)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::notify::{NotificationQueue, Severity};

    pub(crate) fn product(id: &str, cents: i64) -> ProductSummary {
        ProductSummary {
            id: ProductRef::from(id),
            name: format!("Product {id}"),
            unit_price: Price::new(Decimal::new(cents, 2)).unwrap(),
            image: format!("https://cdn.example.com/{id}.jpg"),
        }
    }

    fn manager() -> (CartManager, NotificationQueue, CollectionStore) {
        let store = CollectionStore::in_memory();
        let queue = NotificationQueue::new();
        let manager = CartManager::load(store.clone(), Arc::new(queue.clone()), Identity::Anonymous);
        (manager, queue, store)
    }

    #[test]
    fn test_repeated_adds_sum_quantities() {
        let mut cart = Cart::new();
        cart.add(product("a", 100), 1, Customizations::new());
        cart.add(product("a", 100), 1, Customizations::new());
        cart.add(product("a", 100), 3, Customizations::new());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&"a".into()).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_preserves_arrival_order() {
        let mut cart = Cart::new();
        for id in ["c", "a", "b"] {
            cart.add(product(id, 100), 1, Customizations::new());
        }
        cart.add(product("c", 100), 1, Customizations::new());

        let ids: Vec<&str> = cart.items().iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_add_replaces_customizations() {
        let mut cart = Cart::new();
        let mut first = Customizations::new();
        first.insert("size".into(), serde_json::json!("M"));
        first.insert("gift_wrap".into(), serde_json::json!(true));
        let mut second = Customizations::new();
        second.insert("size".into(), serde_json::json!("L"));

        cart.add(product("a", 100), 1, first);
        cart.add(product("a", 100), 1, second.clone());

        assert_eq!(cart.get(&"a".into()).unwrap().customizations, second);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(product("a", 100), 0, Customizations::new()),
            CartChange::Unchanged
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_below_one_never_removes() {
        let mut cart = Cart::new();
        cart.add(product("a", 100), 4, Customizations::new());

        assert!(!cart.update_quantity(&"a".into(), 0));
        assert_eq!(cart.get(&"a".into()).unwrap().quantity, 4);
        assert!(cart.update_quantity(&"a".into(), 2));
        assert_eq!(cart.get(&"a".into()).unwrap().quantity, 2);
        assert!(!cart.update_quantity(&"missing".into(), 2));
    }

    #[test]
    fn test_remove_then_add_starts_fresh() {
        let mut cart = Cart::new();
        cart.add(product("a", 100), 5, Customizations::new());
        cart.remove(&"a".into());
        cart.add(product("a", 100), 2, Customizations::new());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&"a".into()).unwrap().quantity, 2);
    }

    #[test]
    fn test_totals_follow_interleaved_mutations() {
        let mut cart = Cart::new();
        cart.add(product("a", 1999), 2, Customizations::new());
        cart.add(product("b", 550), 1, Customizations::new());
        cart.update_quantity(&"b".into(), 4);
        cart.add(product("c", 1), 10, Customizations::new());
        cart.remove(&"a".into());
        cart.add(product("a", 1999), 1, Customizations::new());

        let expected: Decimal = cart
            .items()
            .iter()
            .map(|l| l.product.unit_price.amount() * Decimal::from(l.quantity))
            .sum();
        assert_eq!(cart.subtotal(), expected);
        assert_eq!(cart.subtotal(), Decimal::new(550 * 4 + 10 + 1999, 2));
        assert_eq!(cart.total_items(), 15);
    }

    #[test]
    fn test_snapshot_normalizes_duplicates_and_zero_quantities() {
        let json = serde_json::json!([
            { "id": "a", "name": "A", "unit_price": "1.00", "image": "a.jpg", "quantity": 1 },
            { "id": "b", "name": "B", "unit_price": "2.00", "image": "b.jpg", "quantity": 0 },
            { "id": "a", "name": "A", "unit_price": "1.00", "image": "a.jpg", "quantity": 2 }
        ]);
        let cart: Cart = serde_json::from_value(json).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&"a".into()).unwrap().quantity, 3);
    }

    #[test]
    fn test_manager_persists_every_change() {
        let (mut manager, _queue, store) = manager();
        manager.add_to_cart(product("a", 250));
        manager.add_to_cart_with(product("b", 100), 3, Customizations::new());
        manager.update_quantity(&"b".into(), 1);

        let stored: Cart = store.load(&ScopeKey::Cart(Identity::Anonymous));
        assert_eq!(&stored, manager.cart());
        assert_eq!(manager.total_items(), 2);
        assert_eq!(manager.subtotal(), Decimal::new(350, 2));
    }

    #[test]
    fn test_manager_notifications() {
        let (mut manager, queue, _store) = manager();
        manager.add_to_cart(product("a", 100));
        manager.remove_from_cart(&"missing".into());
        manager.remove_from_cart(&"a".into());
        manager.update_quantity(&"a".into(), 3);
        manager.clear_cart();

        let messages: Vec<_> = queue
            .drain()
            .into_iter()
            .map(|n| (n.severity, n.message))
            .collect();
        assert_eq!(
            messages,
            vec![
                (Severity::Success, "Product a added to cart".to_string()),
                (Severity::Info, "Product a removed from cart".to_string()),
                (Severity::Info, "Cart cleared".to_string()),
            ]
        );
    }

    #[test]
    fn test_manager_loads_existing_snapshot() {
        let store = CollectionStore::in_memory();
        let mut saved = Cart::new();
        saved.add(product("x", 100), 2, Customizations::new());
        store.save(&ScopeKey::Cart(Identity::Anonymous), &saved);

        let manager = CartManager::load(store, Arc::new(NotificationQueue::new()), Identity::Anonymous);
        assert_eq!(manager.cart(), &saved);
    }
}
