//! Sign-in error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while turning an identity assertion into a session.
#[derive(Debug, Error)]
pub enum SignInError {
    /// The identity provider did not supply an email.
    #[error("identity assertion has no email")]
    MissingEmail,

    /// The supplied email does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] helpdesk_core::EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl SignInError {
    /// Short code passed to the sign-in page as `?error=`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingEmail | Self::InvalidEmail(_) => "missing_email",
            Self::Repository(_) => "provisioning",
        }
    }
}
