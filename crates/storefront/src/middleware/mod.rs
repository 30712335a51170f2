//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//! 4. Device resolution (per-handler extractor)

pub mod device;
pub mod session;

pub use device::{CurrentDevice, clear_current_user, set_current_user};
pub use session::create_session_layer;
