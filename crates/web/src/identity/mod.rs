//! Identity provider seam.
//!
//! The helpdesk only needs one thing from the identity provider: after the
//! browser returns from the hosted sign-in page, who is this? The answer is
//! an [`IdentityAssertion`]. Everything about roles happens afterwards, in
//! [`crate::services::auth`].

pub mod azure;

use async_trait::async_trait;
use thiserror::Error;

pub use azure::AzureAdProvider;

/// What the identity provider asserts about a signed-in person.
///
/// Both fields are exactly as supplied; the identity bridge decides whether
/// they are acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Errors from the identity provider handshake.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the code exchange.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The token response carried no ID token.
    #[error("token response has no id_token")]
    MissingIdToken,

    /// The ID token could not be decoded.
    #[error("malformed id_token: {0}")]
    MalformedIdToken(String),

    /// The ID token was issued to another client.
    #[error("id_token audience mismatch")]
    AudienceMismatch,

    /// The ID token does not answer this sign-in attempt.
    #[error("id_token nonce mismatch")]
    NonceMismatch,
}

/// An OAuth 2.0 / OIDC provider that can authenticate a browser.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's hosted sign-in page.
    fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String;

    /// Exchange the authorization code returned to `redirect_uri` for an
    /// identity assertion, checking the ID token carries `nonce`.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        nonce: &str,
    ) -> Result<IdentityAssertion, IdentityError>;
}
