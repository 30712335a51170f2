//! Auth route handlers.
//!
//! Credentials are checked by the external identity provider; these routes
//! only tell the device's [`IdentityHub`](crate::identity::IdentityHub) who
//! signed in or out. The cart and wishlist follow asynchronously, so a
//! sign-in answers `202 Accepted` and clients poll `GET /api/auth/session`
//! to see the reconciled identity.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::{DeviceId, Email, Identity, UserId};

use crate::devices::Device;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentDevice, clear_current_user, set_current_user};
use crate::session::lock_session;

/// Sign-in notification from the identity provider.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// The device's current identity.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub device_id: DeviceId,
    pub identity: Identity,
}

impl SessionView {
    fn render(device: &Device) -> Self {
        Self {
            device_id: device.id(),
            identity: lock_session(device.session()).identity(),
        }
    }
}

/// Show who the device's session belongs to.
#[instrument(skip(device))]
pub async fn show(CurrentDevice(device): CurrentDevice) -> Json<SessionView> {
    Json(SessionView::render(&device))
}

/// Record a sign-in.
#[instrument(skip(session, device, request), fields(user_id = %request.user_id))]
pub async fn sign_in(
    session: Session,
    CurrentDevice(device): CurrentDevice,
    Json(request): Json<SignInRequest>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let email = request
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    set_current_user(&session, request.user_id).await?;
    device.identity().sign_in(request.user_id);

    set_sentry_user(&request.user_id, email.as_ref().map(Email::as_str));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(device_id = %device.id(), "User signed in");

    Ok((StatusCode::ACCEPTED, Json(SessionView::render(&device))))
}

/// Record a sign-out.
#[instrument(skip(session, device))]
pub async fn sign_out(
    session: Session,
    CurrentDevice(device): CurrentDevice,
) -> Result<(StatusCode, Json<SessionView>)> {
    clear_current_user(&session).await?;
    device.identity().sign_out();

    clear_sentry_user();
    add_breadcrumb("auth", "Signed out", None);
    tracing::info!(device_id = %device.id(), "User signed out");

    Ok((StatusCode::ACCEPTED, Json(SessionView::render(&device))))
}
