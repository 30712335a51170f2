//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Health check
//!
//! # Products
//! GET    /api/products                    - Search, filter and sort the catalog
//! GET    /api/products/{id}               - One product
//!
//! # Cart
//! GET    /api/cart                        - Cart with totals
//! POST   /api/cart/items                  - Add a product
//! PATCH  /api/cart/items/{id}             - Set a line's quantity
//! DELETE /api/cart/items/{id}             - Remove a line
//! DELETE /api/cart                        - Empty the cart
//!
//! # Wishlist
//! GET    /api/wishlist                    - Saved products
//! POST   /api/wishlist/items              - Save a product
//! POST   /api/wishlist/items/{id}/toggle  - Save or unsave (heart button)
//! GET    /api/wishlist/items/{id}         - Membership check
//! DELETE /api/wishlist/items/{id}         - Unsave a product
//! DELETE /api/wishlist                    - Empty the wishlist
//!
//! # Auth
//! POST   /api/auth/sign-in                - Provider reports a sign-in (202)
//! POST   /api/auth/sign-out               - Provider reports a sign-out (202)
//! GET    /api/auth/session                - Current identity
//!
//! # Checkout
//! GET    /api/checkout/summary            - Totals for the current cart
//! POST   /api/checkout                    - Place an order
//!
//! # Account (requires sign-in)
//! GET    /api/account/orders              - Order history
//! GET    /api/account/orders/{id}         - One order
//! GET    /api/account/addresses           - Saved addresses
//! GET    /api/account/profile             - Name and phone
//! PUT    /api/account/profile             - Update name and phone
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::Request,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).delete(wishlist::clear))
        .route("/items", post(wishlist::add))
        .route(
            "/items/{id}",
            get(wishlist::contains).delete(wishlist::remove),
        )
        .route("/items/{id}/toggle", post(wishlist::toggle))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/session", get(auth::show))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place))
        .route("/summary", get(checkout::summary))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/addresses", get(account::addresses))
        .route("/profile", get(account::profile).put(account::update))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/checkout", checkout_routes())
        .nest("/api/account", account_routes())
}

/// Build the complete application: API routes, health check, sessions and
/// request tracing.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    device_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::middleware::session::SESSION_COOKIE_NAME;
    use crate::store::MemoryBackend;

    fn test_app() -> Router {
        app(AppState::new(
            StorefrontConfig::default(),
            Arc::new(MemoryBackend::default()),
        ))
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_first_request_sets_session_cookie() {
        let response = test_app()
            .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE_NAME));
    }

    #[tokio::test]
    async fn test_account_rejects_anonymous() {
        let response = test_app()
            .oneshot(
                Request::get("/api/account/orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = test_app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_products_filtered_and_sorted() {
        let (status, json) =
            get_json("/api/products?category=toys&material=wood&sort=price-high").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 5);
        assert_eq!(json["products"][0]["id"], "balance-board");
        assert_eq!(json["products"][0]["price"], "59.99");
    }

    #[tokio::test]
    async fn test_products_price_range_and_search() {
        let (_, json) = get_json("/api/products?q=wooden&min_price=30&max_price=40").await;
        let ids: Vec<&str> = json["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["train", "name-puzzle"]);
    }

    #[tokio::test]
    async fn test_unknown_product_and_sort() {
        let (status, _) = get_json("/api/products/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = get_json("/api/products/teddy-bear").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Organic Cotton Teddy Bear");

        let (status, _) = get_json("/api/products?sort=cheapest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_requires_sign_in() {
        let (status, _) = get_json("/api/account/profile").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = test_app()
            .oneshot(
                Request::put("/api/account/profile")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"first_name": "Asha"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_conflicts() {
        let body = serde_json::json!({
            "shipping": {
                "first_name": "Asha",
                "last_name": "Rao",
                "address_line1": "12 MG Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "postal_code": "560001",
                "phone": "9876543210",
                "email": "asha@example.in",
            }
        });
        let response = test_app()
            .oneshot(
                Request::post("/api/checkout")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "your cart is empty");
    }
}
