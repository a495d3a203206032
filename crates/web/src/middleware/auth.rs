//! Extractors for the enriched caller.
//!
//! They read the [`RequestContext`] put in the request extensions by
//! [`super::session_context`]; they never touch the session themselves.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use super::guard::{SIGN_IN_PATH, USER_LANDING};
use crate::models::RequestContext;

/// Extractor that requires a signed-in caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(CurrentUser(ctx): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", ctx.display_name())
/// }
/// ```
pub struct CurrentUser(pub RequestContext);

/// Extractor that requires a signed-in admin.
pub struct RequireAdmin(pub RequestContext);

/// Extractor for an optional caller. Used by actions, which do their own
/// authorization.
pub struct MaybeUser(pub Option<RequestContext>);

/// Rejection for [`CurrentUser`] and [`RequireAdmin`].
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in.
    RedirectToSignIn,
    /// Signed in, but not an admin.
    RedirectToLanding,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::RedirectToLanding => Redirect::to(USER_LANDING).into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(Self)
            .ok_or(AuthRejection::RedirectToSignIn)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(ctx) = CurrentUser::from_request_parts(parts, state).await?;
        if !ctx.is_admin() {
            return Err(AuthRejection::RedirectToLanding);
        }
        Ok(Self(ctx))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<RequestContext>().cloned()))
    }
}
