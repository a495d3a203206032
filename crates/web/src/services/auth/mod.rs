//! Identity bridge and session enrichment.
//!
//! Two halves of the same rule: the identity provider only says who someone
//! is, and the profile store alone says what they may do.
//!
//! - [`IdentityBridge::sign_in`] runs once per sign-in and makes sure a
//!   profile exists for the asserted email.
//! - [`enrich`] runs on every request and attaches the profile's current
//!   role, so a role change takes effect on the very next request.

mod error;

pub use error::SignInError;

use tracing::instrument;

use helpdesk_core::{Email, Role};

use crate::db::ProfileStore;
use crate::identity::IdentityAssertion;
use crate::models::{NewProfile, RequestContext, SignedInUser};

/// Provisions profiles on sign-in.
pub struct IdentityBridge<'a> {
    profiles: &'a dyn ProfileStore,
}

impl<'a> IdentityBridge<'a> {
    /// Create a new identity bridge.
    #[must_use]
    pub const fn new(profiles: &'a dyn ProfileStore) -> Self {
        Self { profiles }
    }

    /// Accept or reject an identity assertion.
    ///
    /// Looks the email up and, if no profile exists, creates one with role
    /// `user`. An existing profile is left untouched: its role and name are
    /// never overwritten by what the identity provider says.
    ///
    /// # Errors
    ///
    /// - `SignInError::MissingEmail` / `InvalidEmail` if the assertion has no
    ///   usable email (nothing is written)
    /// - `SignInError::Repository` if the lookup or insert fails
    #[instrument(skip_all)]
    pub async fn sign_in(&self, assertion: &IdentityAssertion) -> Result<SignedInUser, SignInError> {
        let raw_email = assertion
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(SignInError::MissingEmail)?;
        let email = Email::parse(raw_email)?;

        if self.profiles.find_by_email(&email).await?.is_none() {
            let profile = NewProfile::first_sign_in(email.clone(), assertion.name.as_deref());
            if self.profiles.insert_if_absent(&profile).await? {
                tracing::info!(email = %email, "Provisioned profile on first sign-in");
            }
        }

        tracing::info!(email = %email, "Signed in");

        Ok(SignedInUser {
            email,
            name: assertion
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        })
    }
}

/// Build the request context for a signed-in session.
///
/// The role comes from the profile store on every call. A missing profile,
/// or a failed lookup, yields `user`.
#[instrument(skip_all, fields(email = %user.email))]
pub async fn enrich(profiles: &dyn ProfileStore, user: SignedInUser) -> RequestContext {
    let role = match profiles.find_by_email(&user.email).await {
        Ok(Some(profile)) => profile.role,
        Ok(None) => Role::User,
        Err(e) => {
            tracing::warn!(error = %e, "Profile lookup failed during session enrichment, using least privilege");
            Role::User
        }
    };

    RequestContext {
        email: user.email,
        name: user.name,
        role,
    }
}
