//! Device extractor.
//!
//! Resolves the browser's device from its session, assigning a new device id
//! on the first request.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use marigold_core::{DeviceId, UserId};

use crate::devices::Device;
use crate::error::AppError;
use crate::middleware::session::keys;
use crate::state::AppState;

/// Extractor for the requesting browser's live device.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentDevice(device): CurrentDevice) -> impl IntoResponse {
///     let items = lock_session(device.session()).cart().total_items();
///     format!("{items} items")
/// }
/// ```
pub struct CurrentDevice(pub Arc<Device>);

impl FromRequestParts<AppState> for CurrentDevice {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let id = match session.get::<DeviceId>(keys::DEVICE_ID).await? {
            Some(id) => id,
            None => {
                let id = DeviceId::generate();
                session.insert(keys::DEVICE_ID, id).await?;
                tracing::debug!(device_id = %id, "Assigned new device");
                id
            }
        };
        let user = session.get::<UserId>(keys::USER_ID).await?;

        Span::current().record("device_id", tracing::field::display(id));
        sentry::configure_scope(|scope| {
            scope.set_tag("device_id", id);
        });

        Ok(Self(state.devices().device(id, user).await))
    }
}

/// Remember `user` as signed in on this browser.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::USER_ID, user).await
}

/// Forget the signed-in user (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(keys::USER_ID).await?;
    Ok(())
}
