//! Sign-in, OIDC and sign-out route handlers.
//!
//! - `GET /auth/signin` renders the sign-in page
//! - `GET /api/auth/signin/azure-ad` starts the OIDC flow
//! - `GET /api/auth/callback/azure-ad` finishes it and runs the identity bridge
//! - `POST /api/auth/signout` ends the session
//!
//! Every failure lands back on `/auth/signin?error=<code>`; provider and
//! storage errors are logged, never shown.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use crate::error::clear_sentry_user;
use crate::filters;
use crate::models::session_keys;
use crate::services::IdentityBridge;
use crate::state::AppState;

/// Length of the generated `state` and `nonce` values.
const OIDC_RANDOM_LENGTH: usize = 32;

/// Sign-in page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signin.html")]
pub struct SignInTemplate {
    pub start_url: String,
    pub error_message: Option<&'static str>,
}

/// Query for the sign-in page and for starting the flow.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

/// Query parameters from the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// Message shown for a sign-in error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "missing_email" => "Your account did not provide an email address.",
        "provisioning" => "We could not set up your profile. Please try again.",
        "access_denied" => "Sign-in was cancelled.",
        "invalid_state" => "Your sign-in attempt expired. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// Where to go after sign-in.
///
/// Only same-site destinations are honoured: a path, or an absolute URL with
/// the same origin as `base_url`. Both are resolved against `base_url` and
/// reduced to path and query. Anything else becomes `/`.
#[must_use]
pub fn safe_callback_url(candidate: Option<&str>, base_url: &str) -> String {
    let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
        return "/".to_string();
    };

    // Browsers drop tabs and newlines inside URLs, turning `/\t/host` into `//host`
    if candidate
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace())
    {
        return "/".to_string();
    }

    let Ok(base) = Url::parse(base_url) else {
        return "/".to_string();
    };
    let resolved = if candidate.starts_with('/') {
        base.join(candidate)
    } else {
        Url::parse(candidate)
    };

    match resolved {
        Ok(url) if url.origin() == base.origin() => {
            let mut local = url.path().to_string();
            if let Some(query) = url.query() {
                local.push('?');
                local.push_str(query);
            }
            local
        }
        _ => "/".to_string(),
    }
}

/// Link that starts the OIDC flow, carrying the sanitised callback URL.
fn start_url(callback_url: Option<&str>, base_url: &str) -> String {
    match safe_callback_url(callback_url, base_url).as_str() {
        "/" => "/api/auth/signin/azure-ad".to_string(),
        callback => format!(
            "/api/auth/signin/azure-ad?callbackUrl={}",
            urlencoding::encode(callback)
        ),
    }
}

fn fail(code: &str) -> Response {
    Redirect::to(&format!("/auth/signin?error={code}")).into_response()
}

/// Display the sign-in page.
///
/// # Route
///
/// `GET /auth/signin`
pub async fn signin_page(
    State(state): State<AppState>,
    Query(query): Query<SignInQuery>,
) -> SignInTemplate {
    SignInTemplate {
        start_url: start_url(query.callback_url.as_deref(), state.base_url()),
        error_message: query.error.as_deref().map(error_message),
    }
}

/// Start the OIDC flow.
///
/// Generates `state` and `nonce`, stores them and the callback URL in the
/// session, and redirects to the identity provider.
///
/// # Route
///
/// `GET /api/auth/signin/azure-ad`
#[instrument(skip_all)]
pub async fn start_sign_in(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SignInQuery>,
) -> Response {
    let oidc_state = generate_random_string(OIDC_RANDOM_LENGTH);
    let nonce = generate_random_string(OIDC_RANDOM_LENGTH);
    let callback_url = safe_callback_url(query.callback_url.as_deref(), state.base_url());

    let stored = async {
        session.insert(session_keys::OIDC_STATE, &oidc_state).await?;
        session.insert(session_keys::OIDC_NONCE, &nonce).await?;
        session
            .insert(session_keys::OIDC_CALLBACK_URL, &callback_url)
            .await
    }
    .await;

    if let Err(e) = stored {
        tracing::error!(error = %e, "Failed to store OIDC state in session");
        return fail("session");
    }

    let auth_url =
        state
            .identity()
            .authorization_url(&state.oidc_redirect_uri(), &oidc_state, &nonce);

    Redirect::to(&auth_url).into_response()
}

/// Handle the OIDC callback.
///
/// Verifies `state`, exchanges the code, provisions the profile if needed,
/// then cycles the session id and stores the signed-in identity.
///
/// # Route
///
/// `GET /api/auth/callback/azure-ad`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(%error, %description, "Identity provider returned an error");
        return fail("access_denied");
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        tracing::warn!("OIDC callback missing code or state");
        return fail("invalid_state");
    };

    let stored_state: Option<String> = session
        .remove(session_keys::OIDC_STATE)
        .await
        .ok()
        .flatten();
    let nonce: Option<String> = session
        .remove(session_keys::OIDC_NONCE)
        .await
        .ok()
        .flatten();
    let callback_url: Option<String> = session
        .remove(session_keys::OIDC_CALLBACK_URL)
        .await
        .ok()
        .flatten();

    let Some(nonce) = nonce.filter(|_| stored_state.as_ref() == Some(&returned_state)) else {
        tracing::warn!("OIDC state mismatch");
        return fail("invalid_state");
    };

    let assertion = match state
        .identity()
        .exchange_code(&code, &state.oidc_redirect_uri(), &nonce)
        .await
    {
        Ok(assertion) => assertion,
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OIDC code");
            return fail("token_exchange");
        }
    };

    let user = match IdentityBridge::new(state.profiles()).sign_in(&assertion).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in rejected");
            return fail(e.code());
        }
    };

    let stored = async {
        session.cycle_id().await?;
        session.insert(session_keys::SIGNED_IN_USER, &user).await
    }
    .await;

    if let Err(e) = stored {
        tracing::error!(error = %e, "Failed to store signed-in user in session");
        return fail("session");
    }

    let destination = safe_callback_url(callback_url.as_deref(), state.base_url());
    Redirect::to(&destination).into_response()
}

/// Sign out.
///
/// # Route
///
/// `POST /api/auth/signout`
#[instrument(skip_all)]
pub async fn sign_out(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session on sign-out");
    }
    clear_sentry_user();

    Redirect::to("/auth/signin").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://helpdesk.corp.test";

    #[test]
    fn test_safe_callback_url() {
        assert_eq!(safe_callback_url(None, BASE), "/");
        assert_eq!(safe_callback_url(Some(""), BASE), "/");
        assert_eq!(safe_callback_url(Some("/tickets/4"), BASE), "/tickets/4");
        assert_eq!(
            safe_callback_url(Some("/admin/tickets?page=2"), BASE),
            "/admin/tickets?page=2"
        );
        assert_eq!(
            safe_callback_url(Some("https://helpdesk.corp.test/admin?x=1"), BASE),
            "/admin?x=1"
        );
    }

    #[test]
    fn test_off_site_callback_urls_are_ignored() {
        for evil in [
            "https://evil.test/phish",
            "//evil.test/phish",
            "/\\evil.test",
            "http://helpdesk.corp.test/admin",
            "javascript:alert(1)",
            "dashboard",
            "/\t/evil.test",
            "/\n/evil.test",
            "/\r\n/evil.test/phish",
            "/\\/evil.test",
        ] {
            assert_eq!(safe_callback_url(Some(evil), BASE), "/", "{evil}");
        }
    }

    #[test]
    fn test_same_site_paths_are_normalised() {
        assert_eq!(safe_callback_url(Some("/tickets/../admin"), BASE), "/admin");
        assert_eq!(safe_callback_url(Some("/tickets/4#comments"), BASE), "/tickets/4");
    }

    #[test]
    fn test_start_url_carries_only_safe_callback() {
        assert_eq!(
            start_url(Some("/tickets/4"), BASE),
            "/api/auth/signin/azure-ad?callbackUrl=%2Ftickets%2F4"
        );
        assert_eq!(start_url(None, BASE), "/api/auth/signin/azure-ad");
        assert_eq!(
            start_url(Some("https://evil.test/phish"), BASE),
            "/api/auth/signin/azure-ad"
        );
        assert_eq!(start_url(Some("/\t/evil.test"), BASE), "/api/auth/signin/azure-ad");
    }

    #[test]
    fn test_generate_random_string() {
        let a = generate_random_string(OIDC_RANDOM_LENGTH);
        let b = generate_random_string(OIDC_RANDOM_LENGTH);
        assert_eq!(a.len(), OIDC_RANDOM_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_messages_never_echo_input() {
        assert_eq!(
            error_message("<script>"),
            "Sign-in failed. Please try again."
        );
    }
}
