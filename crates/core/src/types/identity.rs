//! Identity and the storage scopes derived from it.
//!
//! Every persisted collection lives under a [`ScopeKey`]. Keys are built from a
//! tagged [`Identity`] rather than by concatenating a nullable user id, so the
//! anonymous partition and user partitions can never collide.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Who the current client is, as far as the identity provider knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Identity {
    /// Guest browsing without a session.
    #[default]
    Anonymous,
    /// Signed in as a specific user.
    Authenticated(UserId),
}

impl Identity {
    /// Build an identity from an optional user id.
    #[must_use]
    pub const fn from_user(user: Option<UserId>) -> Self {
        match user {
            Some(id) => Self::Authenticated(id),
            None => Self::Anonymous,
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(*id),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str(ANONYMOUS),
            Self::Authenticated(id) => write!(f, "{id}"),
        }
    }
}

const ANONYMOUS: &str = "anonymous";

/// Errors that can occur when parsing a [`ScopeKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeKeyError {
    /// The key has no `kind:scope` separator.
    #[error("scope key must look like <kind>:<scope>, got {0:?}")]
    Malformed(String),
    /// The collection kind is not known.
    #[error("unknown collection kind {0:?}")]
    UnknownKind(String),
    /// The scope part is neither `anonymous` nor a user id.
    #[error("invalid scope {0:?}: expected \"anonymous\" or a user id")]
    InvalidScope(String),
    /// The collection kind only exists for signed-in users.
    #[error("{0} snapshots are only kept for signed-in users")]
    RequiresUser(&'static str),
}

/// Storage key for one persisted collection.
///
/// ```
/// use marigold_core::{Identity, ScopeKey};
///
/// assert_eq!(ScopeKey::Cart(Identity::Anonymous).to_string(), "cart:anonymous");
/// let key: ScopeKey = "wishlist:anonymous".parse().unwrap();
/// assert_eq!(key, ScopeKey::Wishlist(Identity::Anonymous));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Cart(Identity),
    Wishlist(Identity),
    Orders(UserId),
    Addresses(UserId),
    Profile(UserId),
}

impl ScopeKey {
    /// Collection kind prefix of the rendered key.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Cart(_) => "cart",
            Self::Wishlist(_) => "wishlist",
            Self::Orders(_) => "orders",
            Self::Addresses(_) => "addresses",
            Self::Profile(_) => "profile",
        }
    }

    /// The identity this snapshot belongs to.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        match self {
            Self::Cart(identity) | Self::Wishlist(identity) => *identity,
            Self::Orders(user) | Self::Addresses(user) | Self::Profile(user) => {
                Identity::Authenticated(*user)
            }
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.identity())
    }
}

impl FromStr for ScopeKey {
    type Err = ScopeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, scope) = s
            .split_once(':')
            .ok_or_else(|| ScopeKeyError::Malformed(s.to_owned()))?;

        let identity = if scope == ANONYMOUS {
            Identity::Anonymous
        } else {
            let user = scope
                .parse::<UserId>()
                .map_err(|_| ScopeKeyError::InvalidScope(scope.to_owned()))?;
            Identity::Authenticated(user)
        };

        match (kind, identity) {
            ("cart", identity) => Ok(Self::Cart(identity)),
            ("wishlist", identity) => Ok(Self::Wishlist(identity)),
            ("orders", Identity::Authenticated(user)) => Ok(Self::Orders(user)),
            ("addresses", Identity::Authenticated(user)) => Ok(Self::Addresses(user)),
            ("profile", Identity::Authenticated(user)) => Ok(Self::Profile(user)),
            ("orders", Identity::Anonymous) => Err(ScopeKeyError::RequiresUser("orders")),
            ("addresses", Identity::Anonymous) => Err(ScopeKeyError::RequiresUser("addresses")),
            ("profile", Identity::Anonymous) => Err(ScopeKeyError::RequiresUser("profile")),
            (other, _) => Err(ScopeKeyError::UnknownKind(other.to_owned())),
        }
    }
}
