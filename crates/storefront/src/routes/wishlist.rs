//! Wishlist route handlers.

use axum::{Json, extract::Path};
use serde::Serialize;
use tracing::instrument;

use marigold_core::{Identity, ProductRef};

use crate::devices::Device;
use crate::error::{AppError, Result};
use crate::middleware::CurrentDevice;
use crate::notify::Notification;
use crate::session::lock_session;
use crate::wishlist::WishlistItem;

/// Wishlist display data.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub identity: Identity,
    pub items: Vec<WishlistItem>,
    pub count: usize,
    pub notifications: Vec<Notification>,
}

impl WishlistView {
    /// Render the device's current wishlist, draining its notifications.
    pub fn render(device: &Device) -> Self {
        let (identity, items) = {
            let session = lock_session(device.session());
            (
                session.identity(),
                session.wishlist().wishlist().items().to_vec(),
            )
        };

        Self {
            identity,
            count: items.len(),
            items,
            notifications: device.drain_notifications(),
        }
    }
}

/// Membership check response.
#[derive(Debug, Serialize)]
pub struct MembershipView {
    pub in_wishlist: bool,
}

/// Display the wishlist.
#[instrument(skip(device))]
pub async fn show(CurrentDevice(device): CurrentDevice) -> Json<WishlistView> {
    Json(WishlistView::render(&device))
}

/// Save a product.
#[instrument(skip(device, item), fields(product_id = %item.id))]
pub async fn add(
    CurrentDevice(device): CurrentDevice,
    Json(item): Json<WishlistItem>,
) -> Json<WishlistView> {
    lock_session(device.session())
        .wishlist_mut()
        .add_to_wishlist(item);
    Json(WishlistView::render(&device))
}

/// Save the product if it is not saved, remove it otherwise.
///
/// The body carries the product so it can be saved; its id must match the path.
#[instrument(skip(device, item))]
pub async fn toggle(
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<String>,
    Json(item): Json<WishlistItem>,
) -> Result<Json<WishlistView>> {
    if item.id.as_str() != id {
        return Err(AppError::BadRequest(format!(
            "product id {} does not match path {id}",
            item.id
        )));
    }

    lock_session(device.session()).wishlist_mut().toggle(item);
    Ok(Json(WishlistView::render(&device)))
}

/// Whether a product is saved.
#[instrument(skip(device))]
pub async fn contains(
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<String>,
) -> Json<MembershipView> {
    let in_wishlist = lock_session(device.session())
        .wishlist()
        .is_in_wishlist(&ProductRef::from(id));
    Json(MembershipView { in_wishlist })
}

/// Remove a saved product.
#[instrument(skip(device))]
pub async fn remove(
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<String>,
) -> Json<WishlistView> {
    lock_session(device.session())
        .wishlist_mut()
        .remove_from_wishlist(&ProductRef::from(id));
    Json(WishlistView::render(&device))
}

/// Empty the wishlist.
#[instrument(skip(device))]
pub async fn clear(CurrentDevice(device): CurrentDevice) -> Json<WishlistView> {
    lock_session(device.session()).wishlist_mut().clear_wishlist();
    Json(WishlistView::render(&device))
}
