//! Account route handlers.
//!
//! These routes require a signed-in session.

use axum::{Json, extract::Path};
use serde::Serialize;
use tracing::instrument;

use marigold_core::OrderId;

use crate::checkout::{Order, SavedAddress};
use crate::devices::Device;
use crate::error::{AppError, Result};
use crate::middleware::CurrentDevice;
use crate::notify::Notification;
use crate::profile::{Profile, ProfileUpdate, load_profile, update_profile};
use crate::session::lock_session;

fn require_signed_in(device: &Device) -> Result<()> {
    if lock_session(device.session()).identity().is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized("sign in to view your account".to_string()))
    }
}

/// Order history, newest first.
#[instrument(skip(device))]
pub async fn orders(CurrentDevice(device): CurrentDevice) -> Result<Json<Vec<Order>>> {
    require_signed_in(&device)?;
    Ok(Json(lock_session(device.session()).order_history()))
}

/// A single order from the history.
#[instrument(skip(device))]
pub async fn order(
    CurrentDevice(device): CurrentDevice,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    require_signed_in(&device)?;
    lock_session(device.session())
        .order_history()
        .into_iter()
        .find(|order| order.id == id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Saved addresses, most recent (the default) first.
#[instrument(skip(device))]
pub async fn addresses(CurrentDevice(device): CurrentDevice) -> Result<Json<Vec<SavedAddress>>> {
    require_signed_in(&device)?;
    Ok(Json(lock_session(device.session()).saved_addresses()))
}

/// Profile plus the notifications raised by the update.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub notifications: Vec<Notification>,
}

/// The signed-in user's profile.
#[instrument(skip(device))]
pub async fn profile(CurrentDevice(device): CurrentDevice) -> Result<Json<Profile>> {
    require_signed_in(&device)?;
    Ok(Json(load_profile(&lock_session(device.session()))))
}

/// Update first name, last name or phone.
#[instrument(skip(device, update))]
pub async fn update(
    CurrentDevice(device): CurrentDevice,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>> {
    let profile = update_profile(&lock_session(device.session()), update)?;
    Ok(Json(ProfileView {
        profile,
        notifications: device.drain_notifications(),
    }))
}
