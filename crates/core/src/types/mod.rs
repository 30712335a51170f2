//! Core types for Marigold.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Identity, ScopeKey, ScopeKeyError};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
