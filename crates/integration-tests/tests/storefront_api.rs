//! Integration tests for the storefront JSON API.
//!
//! Each test starts an in-process storefront and talks to it with
//! cookie-keeping clients, one per simulated browser.

#![allow(clippy::unwrap_used)]

use marigold_integration_tests::{TestServer, address, browser, eventually, product};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

async fn get(client: &Client, server: &TestServer, path: &str) -> Value {
    client
        .get(server.url(path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn add(client: &Client, server: &TestServer, id: &str, quantity: u32) -> Value {
    client
        .post(server.url("/api/cart/items"))
        .json(&json!({ "product": product(id, "100.00"), "quantity": quantity }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

fn quantities(cart: &Value) -> Vec<(String, u64)> {
    cart["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| {
            (
                line["id"].as_str().unwrap().to_string(),
                line["quantity"].as_u64().unwrap(),
            )
        })
        .collect()
}

async fn sign_in(client: &Client, server: &TestServer, user: Uuid) {
    let resp = client
        .post(server.url("/api/auth/sign-in"))
        .json(&json!({ "user_id": user, "email": "asha@example.in" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    eventually(|| async {
        let session = get(client, server, "/api/auth/session").await;
        session["identity"]["user_id"] == json!(user)
    })
    .await;
}

async fn sign_out(client: &Client, server: &TestServer) {
    let resp = client
        .post(server.url("/api/auth/sign-out"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    eventually(|| async {
        let session = get(client, server, "/api/auth/session").await;
        session["identity"]["kind"] == "anonymous"
    })
    .await;
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let resp = browser().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_guest_cart_accumulates_quantities() {
    let server = TestServer::spawn().await;
    let client = browser();

    let cart = add(&client, &server, "lamp", 1).await;
    assert_eq!(cart["identity"]["kind"], "anonymous");
    assert_eq!(
        cart["notifications"][0]["message"],
        "Product lamp added to cart"
    );

    let cart = add(&client, &server, "lamp", 2).await;
    assert_eq!(quantities(&cart), vec![("lamp".to_string(), 3)]);
    assert_eq!(cart["total_items"], 3);
    assert_eq!(cart["formatted_subtotal"], "₹300.00");
}

#[tokio::test]
async fn test_update_and_remove() {
    let server = TestServer::spawn().await;
    let client = browser();
    add(&client, &server, "a", 1).await;
    add(&client, &server, "b", 1).await;

    let cart: Value = client
        .patch(server.url("/api/cart/items/a"))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quantities(&cart)[0], ("a".to_string(), 5));

    // Zero is not a valid quantity; the line is left alone.
    let cart: Value = client
        .patch(server.url("/api/cart/items/a"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quantities(&cart)[0], ("a".to_string(), 5));

    // Negative quantities are ignored the same way, not rejected.
    let resp = client
        .patch(server.url("/api/cart/items/a"))
        .json(&json!({ "quantity": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(quantities(&cart)[0], ("a".to_string(), 5));

    let cart: Value = client
        .delete(server.url("/api/cart/items/a"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quantities(&cart), vec![("b".to_string(), 1)]);
    assert_eq!(cart["notifications"][0]["message"], "Product a removed from cart");

    let cart: Value = client
        .delete(server.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["total_items"], 0);
    assert_eq!(cart["notifications"][0]["message"], "Cart cleared");
}

#[tokio::test]
async fn test_browsers_do_not_share_carts() {
    let server = TestServer::spawn().await;
    let first = browser();
    let second = browser();

    add(&first, &server, "a", 1).await;
    let cart = get(&second, &server, "/api/cart").await;
    assert_eq!(cart["total_items"], 0);
}

// ============================================================================
// Sign-in reconciliation
// ============================================================================

#[tokio::test]
async fn test_sign_in_merges_guest_cart() {
    let server = TestServer::spawn().await;
    let client = browser();
    let user = Uuid::new_v4();

    // Build a saved cart for the user on this browser.
    sign_in(&client, &server, user).await;
    add(&client, &server, "B", 3).await;
    add(&client, &server, "C", 1).await;
    sign_out(&client, &server).await;
    assert_eq!(get(&client, &server, "/api/cart").await["total_items"], 0);

    // Shop as a guest, then sign in again.
    add(&client, &server, "A", 2).await;
    add(&client, &server, "B", 1).await;
    sign_in(&client, &server, user).await;

    let cart = get(&client, &server, "/api/cart").await;
    assert_eq!(
        quantities(&cart),
        vec![
            ("B".to_string(), 4),
            ("C".to_string(), 1),
            ("A".to_string(), 2)
        ]
    );
    let messages: Vec<&str> = cart["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["message"].as_str())
        .collect();
    assert!(messages.contains(&"Signed in - your cart has been synced"));
}

#[tokio::test]
async fn test_repeated_sign_in_does_not_double_count() {
    let server = TestServer::spawn().await;
    let client = browser();
    let user = Uuid::new_v4();

    add(&client, &server, "A", 2).await;
    sign_in(&client, &server, user).await;
    sign_in(&client, &server, user).await;

    let cart = get(&client, &server, "/api/cart").await;
    assert_eq!(quantities(&cart), vec![("A".to_string(), 2)]);
}

#[tokio::test]
async fn test_sign_in_rejects_invalid_email() {
    let server = TestServer::spawn().await;
    let resp = browser()
        .post(server.url("/api/auth/sign-in"))
        .json(&json!({ "user_id": Uuid::new_v4(), "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_membership_and_toggle() {
    let server = TestServer::spawn().await;
    let client = browser();

    let list: Value = client
        .post(server.url("/api/wishlist/items"))
        .json(&product("vase", "250.00"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["count"], 1);

    let again: Value = client
        .post(server.url("/api/wishlist/items"))
        .json(&product("vase", "250.00"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["count"], 1);
    assert_eq!(
        again["notifications"][0]["message"],
        "Product vase is already in your wishlist"
    );

    let member = get(&client, &server, "/api/wishlist/items/vase").await;
    assert_eq!(member["in_wishlist"], true);

    let toggled: Value = client
        .post(server.url("/api/wishlist/items/vase/toggle"))
        .json(&product("vase", "250.00"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["count"], 0);
    let member = get(&client, &server, "/api/wishlist/items/vase").await;
    assert_eq!(member["in_wishlist"], false);
}

#[tokio::test]
async fn test_toggle_rejects_mismatched_id() {
    let server = TestServer::spawn().await;
    let resp = browser()
        .post(server.url("/api/wishlist/items/vase/toggle"))
        .json(&product("lamp", "250.00"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Checkout and account
// ============================================================================

#[tokio::test]
async fn test_checkout_summary() {
    let server = TestServer::spawn().await;
    let client = browser();
    add(&client, &server, "a", 5).await;

    let summary = get(&client, &server, "/api/checkout/summary").await;
    assert_eq!(summary["item_count"], 5);
    assert_eq!(summary["formatted_total"], "₹690.00");
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_bad_address() {
    let server = TestServer::spawn().await;
    let client = browser();

    let resp = client
        .post(server.url("/api/checkout"))
        .json(&json!({ "shipping": address() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    add(&client, &server, "a", 1).await;
    let mut bad = address();
    bad["phone"] = json!("123");
    let resp = client
        .post(server.url("/api/checkout"))
        .json(&json!({ "shipping": bad }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "shipping.phone");

    // The cart survives a rejected checkout.
    assert_eq!(get(&client, &server, "/api/cart").await["total_items"], 1);
}

#[tokio::test]
async fn test_signed_in_checkout_records_order() {
    let server = TestServer::spawn().await;
    let client = browser();
    sign_in(&client, &server, Uuid::new_v4()).await;
    add(&client, &server, "a", 2).await;

    let resp = client
        .post(server.url("/api/checkout"))
        .json(&json!({
            "shipping": address(),
            "payment_method": "cod",
            "save_address": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["payment_status"], "pending");
    assert!(order["reference"].as_str().unwrap().starts_with('#'));
    assert!(
        order["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["message"] == "Order placed successfully!")
    );

    assert_eq!(get(&client, &server, "/api/cart").await["total_items"], 0);

    let orders = get(&client, &server, "/api/account/orders").await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], order["id"]);

    let id = order["id"].as_str().unwrap();
    let one = get(&client, &server, &format!("/api/account/orders/{id}")).await;
    assert_eq!(one["id"], order["id"]);

    let addresses = get(&client, &server, "/api/account/addresses").await;
    assert_eq!(addresses[0]["kind"], "shipping");
}

#[tokio::test]
async fn test_account_requires_sign_in() {
    let server = TestServer::spawn().await;
    let client = browser();

    for path in [
        "/api/account/orders",
        "/api/account/addresses",
        "/api/account/profile",
    ] {
        let resp = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let server = TestServer::spawn().await;
    let client = browser();
    sign_in(&client, &server, Uuid::new_v4()).await;

    let resp = client
        .get(server.url(&format!("/api/account/orders/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_survives_sign_out() {
    let server = TestServer::spawn().await;
    let client = browser();
    let user = Uuid::new_v4();
    sign_in(&client, &server, user).await;

    let empty = get(&client, &server, "/api/account/profile").await;
    assert_eq!(empty["first_name"], "");

    let resp = client
        .put(server.url("/api/account/profile"))
        .json(&json!({ "first_name": "Asha", "last_name": "Rao", "phone": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "phone");

    let saved: Value = client
        .put(server.url("/api/account/profile"))
        .json(&json!({ "first_name": "Asha", "last_name": "Rao", "phone": "9876543210" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["phone"], "9876543210");
    assert_eq!(
        saved["notifications"][0]["message"],
        "Profile updated successfully"
    );

    sign_out(&client, &server).await;
    sign_in(&client, &server, user).await;
    let profile = get(&client, &server, "/api/account/profile").await;
    assert_eq!(profile["first_name"], "Asha");
    assert_eq!(profile["last_name"], "Rao");
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_listing_and_add_to_cart() {
    let server = TestServer::spawn().await;
    let client = browser();

    let listing = get(&client, &server, "/api/products?age=0-1&sort=rating").await;
    assert_eq!(listing["count"], 5);
    assert_eq!(listing["products"][0]["id"], "baby-blanket");

    // A listed product goes straight into the cart.
    let blanket = &listing["products"][0];
    let cart: Value = client
        .post(server.url("/api/cart/items"))
        .json(&json!({
            "product": {
                "id": blanket["id"],
                "name": blanket["name"],
                "unit_price": blanket["price"],
                "image": blanket["image"],
            }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["subtotal"], "49.99");
}
