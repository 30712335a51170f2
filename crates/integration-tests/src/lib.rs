//! Integration tests for Marigold.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marigold-integration-tests
//! ```
//!
//! Each test starts its own storefront on an ephemeral local port, so no
//! external services are needed.
//!
//! # Test Categories
//!
//! - `storefront_api` - Cart, wishlist, sign-in and checkout over HTTP
//! - `reconciliation` - Library-level sign-in merges against a file backend

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use marigold_storefront::config::StorefrontConfig;
use marigold_storefront::routes;
use marigold_storefront::state::AppState;
use marigold_storefront::store::{MemoryBackend, SnapshotBackend};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A storefront running in the background of the test runtime.
pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Arc<dyn SnapshotBackend>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a storefront with default configuration and an in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        Self::spawn_with(StorefrontConfig::default(), Arc::new(MemoryBackend::default())).await
    }

    /// Start a storefront over `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn_with(config: StorefrontConfig, backend: Arc<dyn SnapshotBackend>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let app = routes::app(AppState::new(config, Arc::clone(&backend)));
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            addr,
            backend,
            task,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A client that keeps cookies, i.e. one browser.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Product JSON as the catalog would send it.
#[must_use]
pub fn product(id: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "unit_price": price,
        "image": format!("https://cdn.example.com/{id}.jpg"),
    })
}

/// A valid shipping address form.
#[must_use]
pub fn address() -> Value {
    json!({
        "first_name": "Asha",
        "last_name": "Rao",
        "address_line1": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560001",
        "phone": "9876543210",
        "email": "asha@example.in",
    })
}

/// Poll `check` until it returns true.
///
/// # Panics
///
/// Panics if `check` is still false after two seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 2s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
