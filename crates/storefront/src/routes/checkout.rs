//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use crate::checkout::{CheckoutRequest, Order, OrderSummary, place_order};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CurrentDevice;
use crate::notify::{Notification, NotificationSink};
use crate::session::lock_session;
use crate::state::AppState;

/// Checkout summary display data.
#[derive(Debug, Serialize)]
pub struct SummaryView {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub formatted_total: String,
}

/// Placed order display data.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub reference: String,
    #[serde(flatten)]
    pub order: Order,
    pub notifications: Vec<Notification>,
}

/// Totals for the current cart.
#[instrument(skip(state, device))]
pub async fn summary(
    State(state): State<AppState>,
    CurrentDevice(device): CurrentDevice,
) -> Json<SummaryView> {
    let summary = OrderSummary::for_cart(
        lock_session(device.session()).cart().cart(),
        &state.config().checkout,
    );

    Json(SummaryView {
        formatted_total: summary.display_total(),
        summary,
    })
}

/// Place an order for the current cart.
#[instrument(skip(state, device, request), fields(payment_method = %request.payment_method))]
pub async fn place(
    State(state): State<AppState>,
    CurrentDevice(device): CurrentDevice,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let result = {
        let mut session = lock_session(device.session());
        let result = place_order(&mut session, request, &state.config().checkout);
        if let Err(e) = &result {
            session
                .notifier()
                .notify(Notification::error(format!("Failed to place order: {e}")));
        }
        result
    };
    let order = result?;

    let reference = order.reference();
    add_breadcrumb("checkout", "Order placed", Some(&[("order", &reference)]));

    Ok((
        StatusCode::CREATED,
        Json(OrderView {
            reference,
            order,
            notifications: device.drain_notifications(),
        }),
    ))
}
