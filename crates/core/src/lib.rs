//! Marigold Core - Shared types library.
//!
//! This crate provides the domain types used across Marigold components:
//! - `storefront` - Cart, wishlist and checkout service with its JSON API
//! - `cli` - Command-line tools for inspecting persisted snapshots
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage
//! backends, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, identities and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
