//! Entra ID (Azure AD) OIDC client.
//!
//! # Flow
//!
//! 1. Redirect the browser to [`AzureAdProvider::authorization_url`]
//! 2. Entra ID redirects back with `code` and `state`
//! 3. [`AzureAdProvider::exchange_code`] posts the code to the token endpoint
//! 4. The returned ID token's claims become an [`IdentityAssertion`]
//!
//! The ID token comes straight from the token endpoint over TLS, authenticated
//! with our client secret, so its signature is not re-verified. The audience
//! and nonce are still checked.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use super::{IdentityAssertion, IdentityError, IdentityProvider};
use crate::config::AzureAdConfig;

const SCOPES: &str = "openid profile email";

/// Token endpoint response (only the fields we use).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

/// Token endpoint error body.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// `aud` is a single string for Entra ID, but OIDC allows an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::One(aud) => aud == client_id,
            Self::Many(auds) => auds.iter().any(|a| a == client_id),
        }
    }
}

/// ID token claims (only the fields we use).
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    aud: Audience,
    #[serde(default)]
    nonce: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl IdTokenClaims {
    /// Work accounts often omit `email`; their UPN-style
    /// `preferred_username` is the mailbox address.
    fn into_assertion(self) -> IdentityAssertion {
        let email = self.email.or_else(|| {
            self.preferred_username
                .filter(|username| username.contains('@'))
        });

        IdentityAssertion {
            email,
            name: self.name,
        }
    }
}

/// Decode the claims segment of a compact JWT.
fn decode_claims(id_token: &str) -> Result<IdTokenClaims, IdentityError> {
    let mut segments = id_token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature)) => payload,
        _ => {
            return Err(IdentityError::MalformedIdToken(
                "expected three segments".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityError::MalformedIdToken(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| IdentityError::MalformedIdToken(e.to_string()))
}

/// Decode the ID token and check it was issued to `client_id` for `nonce`.
fn verify_id_token(
    id_token: &str,
    client_id: &str,
    nonce: &str,
) -> Result<IdentityAssertion, IdentityError> {
    let claims = decode_claims(id_token)?;

    if !claims.aud.contains(client_id) {
        return Err(IdentityError::AudienceMismatch);
    }
    if claims.nonce.as_deref() != Some(nonce) {
        return Err(IdentityError::NonceMismatch);
    }

    Ok(claims.into_assertion())
}

/// Client for the Entra ID v2.0 endpoints.
#[derive(Clone)]
pub struct AzureAdProvider {
    inner: Arc<AzureAdProviderInner>,
}

struct AzureAdProviderInner {
    client: reqwest::Client,
    config: AzureAdConfig,
}

impl AzureAdProvider {
    /// Create a new Entra ID client.
    #[must_use]
    pub fn new(config: AzureAdConfig) -> Self {
        Self {
            inner: Arc::new(AzureAdProviderInner {
                client: reqwest::Client::new(),
                config,
            }),
        }
    }
}

#[async_trait]
impl IdentityProvider for AzureAdProvider {
    fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        let config = &self.inner.config;
        format!(
            "{}?\
            client_id={}&\
            response_type=code&\
            response_mode=query&\
            redirect_uri={}&\
            scope={}&\
            state={}&\
            nonce={}",
            config.authorize_endpoint(),
            urlencoding::encode(&config.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        nonce: &str,
    ) -> Result<IdentityAssertion, IdentityError> {
        let config = &self.inner.config;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES),
        ];

        let response = self
            .inner
            .client
            .post(config.token_endpoint())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<TokenErrorResponse>().await {
                Ok(body) => format!(
                    "{status}: {} {}",
                    body.error,
                    body.error_description.unwrap_or_default()
                ),
                Err(_) => status.to_string(),
            };
            return Err(IdentityError::TokenExchange(message));
        }

        let token: TokenResponse = response.json().await?;
        let id_token = token.id_token.ok_or(IdentityError::MissingIdToken)?;

        verify_id_token(&id_token, &config.client_id, nonce)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const CLIENT_ID: &str = "helpdesk-client";

    fn token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    fn provider() -> AzureAdProvider {
        AzureAdProvider::new(AzureAdConfig {
            client_id: CLIENT_ID.to_string(),
            client_secret: SecretString::from("Zq8~vR3kP1xW7mN2bT5yH9cJ4gL6dF0s"),
            tenant_id: "contoso".to_string(),
            authority: "https://login.microsoftonline.com".to_string(),
        })
    }

    #[test]
    fn test_verify_id_token_extracts_assertion() {
        let id_token = token(&serde_json::json!({
            "aud": CLIENT_ID,
            "nonce": "n-1",
            "email": "Alice@Corp.com",
            "name": "Alice Smith",
        }));

        let assertion = verify_id_token(&id_token, CLIENT_ID, "n-1").unwrap();
        assert_eq!(assertion.email.as_deref(), Some("Alice@Corp.com"));
        assert_eq!(assertion.name.as_deref(), Some("Alice Smith"));
    }

    #[test]
    fn test_preferred_username_fallback() {
        let id_token = token(&serde_json::json!({
            "aud": [CLIENT_ID, "other"],
            "nonce": "n-1",
            "preferred_username": "bob@corp.com",
        }));

        let assertion = verify_id_token(&id_token, CLIENT_ID, "n-1").unwrap();
        assert_eq!(assertion.email.as_deref(), Some("bob@corp.com"));
        assert!(assertion.name.is_none());
    }

    #[test]
    fn test_username_without_at_is_not_an_email() {
        let id_token = token(&serde_json::json!({
            "aud": CLIENT_ID,
            "nonce": "n-1",
            "preferred_username": "bob",
        }));

        let assertion = verify_id_token(&id_token, CLIENT_ID, "n-1").unwrap();
        assert!(assertion.email.is_none());
    }

    #[test]
    fn test_audience_and_nonce_are_checked() {
        let foreign = token(&serde_json::json!({ "aud": "someone-else", "nonce": "n-1" }));
        assert!(matches!(
            verify_id_token(&foreign, CLIENT_ID, "n-1"),
            Err(IdentityError::AudienceMismatch)
        ));

        let replayed = token(&serde_json::json!({ "aud": CLIENT_ID, "nonce": "old" }));
        assert!(matches!(
            verify_id_token(&replayed, CLIENT_ID, "n-1"),
            Err(IdentityError::NonceMismatch)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            decode_claims("only.two"),
            Err(IdentityError::MalformedIdToken(_))
        ));
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(IdentityError::MalformedIdToken(_))
        ));
    }

    #[test]
    fn test_authorization_url() {
        let url = provider().authorization_url(
            "https://helpdesk.corp.test/api/auth/callback/azure-ad",
            "st",
            "no",
        );

        assert!(url.starts_with(
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize?"
        ));
        assert!(url.contains("client_id=helpdesk-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20profile%20email"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fhelpdesk.corp.test%2Fapi%2Fauth%2Fcallback%2Fazure-ad"
        ));
        assert!(url.contains("state=st"));
        assert!(url.contains("nonce=no"));
    }
}
