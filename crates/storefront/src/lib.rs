//! Marigold storefront library.
//!
//! Cart and wishlist state for a storefront whose shoppers may browse
//! anonymously and sign in later. State is persisted per identity scope
//! (`cart:anonymous`, `cart:<user>`, ...) after every change, and guest state
//! is reconciled into the user's saved state at sign-in.
//!
//! The library is usable on its own through [`session::ShopSession`]; the
//! `marigold-storefront` binary serves it as a JSON API with one session per
//! browser device.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod devices;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod notify;
pub mod profile;
pub mod reconcile;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod wishlist;
