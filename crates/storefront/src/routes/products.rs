//! Product listing route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;

use marigold_core::ProductRef;

use crate::catalog::{Product, ProductFilter};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Listing response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: usize,
}

/// Search, filter and sort the catalog.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Json<ProductList> {
    let products: Vec<Product> = state
        .catalog()
        .search(&filter)
        .into_iter()
        .cloned()
        .collect();
    Json(ProductList {
        count: products.len(),
        products,
    })
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductRef>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
