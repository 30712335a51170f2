//! Cart route handlers.
//!
//! Every response carries the full cart plus the notifications raised since
//! the previous response, so the client can redraw the cart and show toasts
//! in one pass.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marigold_core::{Identity, ProductRef};

use crate::cart::{CartChange, Customizations, LineItem, ProductSummary};
use crate::devices::Device;
use crate::error::add_breadcrumb;
use crate::middleware::CurrentDevice;
use crate::notify::Notification;
use crate::session::lock_session;
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub identity: Identity,
    pub items: Vec<LineItem>,
    pub total_items: u64,
    pub subtotal: Decimal,
    pub formatted_subtotal: String,
    pub notifications: Vec<Notification>,
}

impl CartView {
    /// Render the device's current cart, draining its notifications.
    pub fn render(device: &Device, state: &AppState) -> Self {
        let (identity, items, total_items, subtotal) = {
            let session = lock_session(device.session());
            let cart = session.cart();
            (
                session.identity(),
                cart.cart().items().to_vec(),
                cart.total_items(),
                cart.subtotal(),
            )
        };

        Self {
            identity,
            items,
            total_items,
            subtotal,
            formatted_subtotal: state.config().checkout.currency.format(subtotal),
            notifications: device.drain_notifications(),
        }
    }
}

/// Add to cart request body.
///
/// Quantities are signed on the wire so that a quantity below one is ignored
/// rather than rejected.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product: ProductSummary,
    pub quantity: Option<i64>,
    #[serde(default)]
    pub customizations: Customizations,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Clamp a requested quantity into the cart's range. Anything below one maps
/// to zero, which the cart treats as no change.
fn requested_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

/// Display the cart.
#[instrument(skip(state, device))]
pub async fn show(State(state): State<AppState>, CurrentDevice(device): CurrentDevice) -> Json<CartView> {
    Json(CartView::render(&device, &state))
}

/// Add a product to the cart.
#[instrument(skip(state, device, request), fields(product_id = %request.product.id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentDevice(device): CurrentDevice,
    Json(request): Json<AddToCartRequest>,
) -> Json<CartView> {
    let product_id = request.product.id.to_string();
    let change = lock_session(device.session()).cart_mut().add_to_cart_with(
        request.product,
        requested_quantity(request.quantity.unwrap_or(1)),
        request.customizations,
    );

    if change != CartChange::Unchanged {
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product_id)]));
    }

    Json(CartView::render(&device, &state))
}

/// Set the quantity of a cart line. Quantities below one are ignored.
#[instrument(skip(state, device))]
pub async fn update(
    State(state): State<AppState>,
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Json<CartView> {
    lock_session(device.session())
        .cart_mut()
        .update_quantity(&ProductRef::from(id), requested_quantity(request.quantity));

    Json(CartView::render(&device, &state))
}

/// Remove a line from the cart.
#[instrument(skip(state, device))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<String>,
) -> Json<CartView> {
    let change = lock_session(device.session())
        .cart_mut()
        .remove_from_cart(&ProductRef::from(id.as_str()));

    if matches!(change, CartChange::Removed(_)) {
        add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", &id)]));
    }

    Json(CartView::render(&device, &state))
}

/// Empty the cart.
#[instrument(skip(state, device))]
pub async fn clear(State(state): State<AppState>, CurrentDevice(device): CurrentDevice) -> Json<CartView> {
    lock_session(device.session()).cart_mut().clear_cart();
    Json(CartView::render(&device, &state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_quantity_ignores_below_one() {
        assert_eq!(requested_quantity(-1), 0);
        assert_eq!(requested_quantity(0), 0);
        assert_eq!(requested_quantity(3), 3);
        assert_eq!(requested_quantity(i64::MAX), u32::MAX);
    }
}
