//! Product catalog with search, filters and sorting.
//!
//! The storefront ships a built-in catalog (`data/catalog.json`). A different
//! one can be loaded from a JSON file with the same shape.

use std::cmp::Reverse;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marigold_core::{Price, ProductRef};

use crate::cart::ProductSummary;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductRef,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub category: String,
    /// Average review score out of five.
    pub rating: Decimal,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub materials: Vec<String>,
    /// Recommended age in years, e.g. "1-3".
    pub age_range: String,
}

impl Product {
    /// The fields the cart and wishlist keep.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            image: self.image.clone(),
        }
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Catalog order.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Rating,
    /// New arrivals first, otherwise catalog order.
    Newest,
}

/// Listing query, as sent in the query string.
///
/// `category`, `material` and `age` take comma-separated lists. A product
/// passes a list filter when it matches any entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Case-insensitive text matched against name and category.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category: Option<String>,
    pub material: Option<String>,
    pub age: Option<String>,
    pub sort: SortKey,
}

impl ProductFilter {
    /// Whether `product` passes every filter. Price bounds are inclusive.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            if !product.name.to_lowercase().contains(&q)
                && !product.category.to_lowercase().contains(&q)
            {
                return false;
            }
        }

        let price = product.price.amount();
        if self.min_price.is_some_and(|min| price < min)
            || self.max_price.is_some_and(|max| price > max)
        {
            return false;
        }

        let categories = list(self.category.as_deref());
        if !categories.is_empty() && !categories.contains(&product.category.to_lowercase()) {
            return false;
        }

        let materials = list(self.material.as_deref());
        if !materials.is_empty()
            && !product
                .materials
                .iter()
                .any(|material| materials.contains(&material.to_lowercase()))
        {
            return false;
        }

        let ages = list(self.age.as_deref());
        ages.is_empty() || ages.contains(&product.age_range.to_lowercase())
    }

    /// Filter and sort `products`. Ties keep catalog order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut matched: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortKey::Featured => {}
            SortKey::PriceLow => matched.sort_by_key(|p| p.price),
            SortKey::PriceHigh => matched.sort_by_key(|p| Reverse(p.price)),
            SortKey::Rating => matched.sort_by_key(|p| Reverse(p.rating)),
            SortKey::Newest => matched.sort_by_key(|p| !p.is_new),
        }
        matched
    }
}

fn list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// The products offered by the store, in featured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the JSON does not describe products.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Read a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.products.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// The catalog bundled with the storefront.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOG).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in catalog is invalid, serving no products");
            Self::default()
        })
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, id: &ProductRef) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    #[must_use]
    pub fn search(&self, filter: &ProductFilter) -> Vec<&Product> {
        filter.apply(&self.products)
    }
}
