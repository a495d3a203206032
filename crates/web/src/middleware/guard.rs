//! Route guard.
//!
//! | Caller | Path class | Outcome |
//! |---|---|---|
//! | signed out | auth | allow |
//! | signed in | auth | redirect `/dashboard` |
//! | signed out | protected or admin | redirect `/auth/signin?callbackUrl=…` |
//! | signed in, not admin | admin | redirect `/dashboard` |
//! | signed in | protected, or admin as admin | allow |
//!
//! Every other path passes through untouched. Actions under `/actions` are
//! deliberately not guarded here; they check the caller themselves.

use axum::{
    extract::Request,
    http::uri::PathAndQuery,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use helpdesk_core::Role;

use crate::models::RequestContext;

/// Where signed-in callers are sent when a page is not for them.
pub const USER_LANDING: &str = "/dashboard";

/// Sign-in page.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// How the guard treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// `/auth` and below.
    Auth,
    /// `/admin` and below.
    Admin,
    /// `/dashboard`, `/tickets` and below.
    Protected,
    /// Everything else.
    Open,
}

/// Whether `path` is `prefix` or a sub-path of it.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Classify a request path.
#[must_use]
pub fn classify(path: &str) -> PathClass {
    if under(path, "/auth") {
        PathClass::Auth
    } else if under(path, "/admin") {
        PathClass::Admin
    } else if under(path, "/dashboard") || under(path, "/tickets") {
        PathClass::Protected
    } else {
        PathClass::Open
    }
}

/// Guard outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Sign-in URL that returns to `target` (path and query) afterwards.
#[must_use]
pub fn sign_in_url(target: &str) -> String {
    format!("{SIGN_IN_PATH}?callbackUrl={}", urlencoding::encode(target))
}

/// Decide what to do with a request.
///
/// `role` is `None` for signed-out callers. `target` is the path and query,
/// used as the post-sign-in destination.
#[must_use]
pub fn decide(class: PathClass, role: Option<Role>, target: &str) -> GuardDecision {
    match (class, role) {
        (PathClass::Open, _) | (PathClass::Auth, None) => GuardDecision::Allow,
        (PathClass::Auth, Some(_)) => GuardDecision::Redirect(USER_LANDING.to_string()),
        (PathClass::Admin | PathClass::Protected, None) => {
            GuardDecision::Redirect(sign_in_url(target))
        }
        (PathClass::Admin, Some(role)) if !role.is_admin() => {
            GuardDecision::Redirect(USER_LANDING.to_string())
        }
        (PathClass::Admin | PathClass::Protected, Some(_)) => GuardDecision::Allow,
    }
}

/// Middleware applying [`decide`] using the enriched [`RequestContext`].
pub async fn route_guard(request: Request, next: Next) -> Response {
    let decision = {
        let role = request
            .extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.role);
        let uri = request.uri();
        let target = uri
            .path_and_query()
            .map_or_else(|| uri.path(), PathAndQuery::as_str);

        decide(classify(uri.path()), role, target)
    };

    match decision {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(path = %request.uri().path(), redirect = %to, "Route guard redirect");
            Redirect::to(&to).into_response()
        }
    }
}
