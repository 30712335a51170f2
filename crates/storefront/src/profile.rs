//! Account profile for signed-in users, stored under `profile:<user>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use marigold_core::{ScopeKey, UserId};

use crate::checkout::FieldError;
use crate::notify::Notification;
use crate::session::ShopSession;

const MIN_PHONE_LEN: usize = 10;

/// Errors updating a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("sign in to edit your profile")]
    SignedOut,

    #[error("invalid profile: {} field(s) need attention", .0.len())]
    Invalid(Vec<FieldError>),
}

/// Contact details shown on the account page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Profile form as submitted. Omitted fields keep their saved value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    fn apply(self, mut profile: Profile) -> Result<Profile, ProfileError> {
        if let Some(first_name) = self.first_name {
            profile.first_name = first_name.trim().to_owned();
        }
        if let Some(last_name) = self.last_name {
            profile.last_name = last_name.trim().to_owned();
        }
        if let Some(phone) = self.phone {
            profile.phone = phone.trim().to_owned();
        }

        // Phone is optional, but a short one is a typo.
        if !profile.phone.is_empty() && profile.phone.len() < MIN_PHONE_LEN {
            return Err(ProfileError::Invalid(vec![FieldError::new(
                "phone",
                "Phone number must have at least 10 digits",
            )]));
        }
        Ok(profile)
    }
}

fn profile_key(session: &ShopSession) -> Option<(UserId, ScopeKey)> {
    let user = session.identity().user_id()?;
    Some((user, ScopeKey::Profile(user)))
}

/// The signed-in user's profile; empty for guests and users who never saved one.
#[must_use]
pub fn load_profile(session: &ShopSession) -> Profile {
    profile_key(session)
        .map(|(_, key)| session.store().load(&key))
        .unwrap_or_default()
}

/// Apply `update` to the signed-in user's profile and save it.
///
/// # Errors
///
/// Returns `ProfileError::SignedOut` for guests, or `ProfileError::Invalid`
/// if the phone number is too short. Nothing is saved on error.
pub fn update_profile(
    session: &ShopSession,
    update: ProfileUpdate,
) -> Result<Profile, ProfileError> {
    let (user, key) = profile_key(session).ok_or(ProfileError::SignedOut)?;

    let mut profile = update.apply(session.store().load(&key))?;
    profile.updated_at = Some(Utc::now());
    session.store().save(&key, &profile);

    info!(user_id = %user, "Profile updated");
    session
        .notifier()
        .notify(Notification::success("Profile updated successfully"));
    Ok(profile)
}
