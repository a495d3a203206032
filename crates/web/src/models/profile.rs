//! Profile domain types.
//!
//! A profile is the only source of truth for authorization: the identity
//! provider proves who a caller is, the profile says what they may do.

use chrono::{DateTime, Utc};

use helpdesk_core::{Email, Role};

/// Display name used when the identity provider does not supply one.
pub const FALLBACK_DISPLAY_NAME: &str = "Unknown";

/// A stored profile (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile key.
    pub email: Email,
    /// Display name captured at first sign-in.
    pub full_name: String,
    /// Access level. Only changed out of band.
    pub role: Role,
    /// When the profile was provisioned.
    pub created_at: DateTime<Utc>,
}

/// Data for provisioning a profile on first sign-in.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: Email,
    pub full_name: String,
    pub role: Role,
}

impl NewProfile {
    /// Profile for a first-time sign-in: role `user`, and the fallback name
    /// when the supplied one is absent or blank.
    #[must_use]
    pub fn first_sign_in(email: Email, name: Option<&str>) -> Self {
        let full_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string();

        Self {
            email,
            full_name,
            role: Role::User,
        }
    }
}
