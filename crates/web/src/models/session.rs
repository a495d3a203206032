//! Session-related types.
//!
//! The session only remembers who signed in. What they may do is looked up
//! again on every request and carried in a [`RequestContext`].

use serde::{Deserialize, Serialize};

use helpdesk_core::{Email, Role};

/// Session-stored identity.
///
/// Written once by the OIDC callback after the profile has been provisioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedInUser {
    /// Email asserted by the identity provider (normalised).
    pub email: Email,
    /// Display name asserted by the identity provider.
    pub name: Option<String>,
}

/// Per-request identity with the role read from the profile store.
///
/// Built by session enrichment and placed in the request extensions for
/// the lifetime of a single request. Never stored in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub email: Email,
    pub name: Option<String>,
    pub role: Role,
}

impl RequestContext {
    /// Whether the caller may use the administrative area.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name to show in the navigation bar.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.email.as_str())
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the signed-in user.
    pub const SIGNED_IN_USER: &str = "signed_in_user";

    /// Key for the OIDC `state` parameter of an in-flight sign-in.
    pub const OIDC_STATE: &str = "oidc_state";

    /// Key for the OIDC `nonce` of an in-flight sign-in.
    pub const OIDC_NONCE: &str = "oidc_nonce";

    /// Key for where to send the browser once sign-in completes.
    pub const OIDC_CALLBACK_URL: &str = "oidc_callback_url";
}
