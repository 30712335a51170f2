//! Sign-in reconciliation of guest state into a user's saved state.
//!
//! When a guest signs in, the cart they built while anonymous and the cart
//! saved for their account are combined:
//!
//! | guest cart | saved cart | result |
//! |------------|------------|--------|
//! | empty      | empty      | empty |
//! | empty      | non-empty  | saved cart |
//! | non-empty  | empty      | guest cart |
//! | non-empty  | non-empty  | saved lines in order, guest quantities added onto matching products, guest-only products appended |
//!
//! Wishlists merge as a set union, saved items first.
//!
//! Merging an empty guest cart is the identity, which is what makes a replayed
//! sign-in harmless once the guest scope has been emptied.

use marigold_core::UserId;
use tracing::info;

use crate::cart::Cart;
use crate::wishlist::Wishlist;

/// Which of the four merge cases applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    BothEmpty,
    KeptSaved,
    KeptGuest,
    Combined,
}

/// Merge a guest cart into a user's saved cart.
#[must_use]
pub fn merge_carts(saved: Cart, guest: Cart) -> (Cart, MergeKind) {
    let kind = match (guest.is_empty(), saved.is_empty()) {
        (true, true) => MergeKind::BothEmpty,
        (true, false) => MergeKind::KeptSaved,
        (false, true) => MergeKind::KeptGuest,
        (false, false) => MergeKind::Combined,
    };

    let merged = match kind {
        MergeKind::BothEmpty | MergeKind::KeptSaved => saved,
        MergeKind::KeptGuest => guest,
        MergeKind::Combined => {
            let mut merged = saved;
            for line in Vec::from(guest) {
                merged.absorb(line);
            }
            merged
        }
    };

    (merged, kind)
}

/// Merge a guest wishlist into a user's saved wishlist.
#[must_use]
pub fn merge_wishlists(saved: Wishlist, guest: Wishlist) -> Wishlist {
    let mut merged = saved;
    for item in Vec::from(guest) {
        merged.insert(item);
    }
    merged
}

/// Result of reconciling a session at sign-in.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub cart: Cart,
    pub wishlist: Wishlist,
    pub kind: MergeKind,
}

/// Combine guest and saved state for `user`.
#[must_use]
pub fn reconcile(
    user: UserId,
    guest_cart: Cart,
    saved_cart: Cart,
    guest_wishlist: Wishlist,
    saved_wishlist: Wishlist,
) -> Reconciled {
    let (cart, kind) = merge_carts(saved_cart, guest_cart);
    let wishlist = merge_wishlists(saved_wishlist, guest_wishlist);
    info!(
        user_id = %user,
        merge = ?kind,
        lines = cart.len(),
        wishlist_items = wishlist.len(),
        "Reconciled guest state at sign-in"
    );
    Reconciled {
        cart,
        wishlist,
        kind,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::Customizations;
    use crate::cart::tests::product;

    fn cart(lines: &[(&str, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (id, quantity) in lines {
            cart.add(product(id, 100), *quantity, Customizations::new());
        }
        cart
    }

    fn quantities(cart: &Cart) -> Vec<(String, u32)> {
        cart.items()
            .iter()
            .map(|l| (l.id().to_string(), l.quantity))
            .collect()
    }

    #[test]
    fn test_combined_merge_adds_quantities_and_appends() {
        let guest = cart(&[("A", 2), ("B", 1)]);
        let saved = cart(&[("B", 3), ("C", 1)]);

        let (merged, kind) = merge_carts(saved, guest);
        assert_eq!(kind, MergeKind::Combined);
        assert_eq!(
            quantities(&merged),
            vec![("B".into(), 4), ("C".into(), 1), ("A".into(), 2)]
        );
    }

    #[test]
    fn test_empty_saved_keeps_guest() {
        let (merged, kind) = merge_carts(Cart::new(), cart(&[("A", 2)]));
        assert_eq!(kind, MergeKind::KeptGuest);
        assert_eq!(quantities(&merged), vec![("A".into(), 2)]);
    }

    #[test]
    fn test_empty_guest_keeps_saved() {
        let saved = cart(&[("B", 3)]);
        let (merged, kind) = merge_carts(saved.clone(), Cart::new());
        assert_eq!(kind, MergeKind::KeptSaved);
        assert_eq!(merged, saved);
    }

    #[test]
    fn test_merge_is_order_independent_for_quantities() {
        let x = cart(&[("A", 1), ("B", 2)]);
        let y = cart(&[("B", 5), ("C", 1)]);

        let (xy, _) = merge_carts(x.clone(), y.clone());
        let (yx, _) = merge_carts(y, x);
        for line in xy.items() {
            assert_eq!(yx.get(line.id()).unwrap().quantity, line.quantity);
        }
        assert_eq!(xy.total_items(), yx.total_items());
    }

    #[test]
    fn test_wishlist_union_keeps_saved_order() {
        let mut saved = Wishlist::new();
        saved.insert(product("b", 100));
        saved.insert(product("c", 100));
        let mut guest = Wishlist::new();
        guest.insert(product("a", 100));
        guest.insert(product("b", 100));

        let merged = merge_wishlists(saved, guest);
        let ids: Vec<&str> = merged.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_reconcile_replay_with_empty_guest_is_noop() {
        let user = UserId::generate();
        let first = reconcile(
            user,
            cart(&[("A", 2)]),
            cart(&[("A", 1)]),
            Wishlist::new(),
            Wishlist::new(),
        );
        let replay = reconcile(
            user,
            Cart::new(),
            first.cart.clone(),
            Wishlist::new(),
            first.wishlist.clone(),
        );
        assert_eq!(replay.cart, first.cart);
        assert_eq!(replay.kind, MergeKind::KeptSaved);
    }
}
