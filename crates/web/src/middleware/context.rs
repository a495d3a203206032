//! Session enrichment middleware.
//!
//! Runs on every request that reaches the application routes: reads the
//! signed-in identity from the session, looks up the current role and puts
//! a [`RequestContext`] in the request extensions. Nothing about the role is
//! carried over from a previous request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{RequestContext, SignedInUser, session_keys};
use crate::services;
use crate::state::AppState;

/// Attach the caller's [`RequestContext`], if signed in.
pub async fn session_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = request.extensions().get::<Session>().cloned();

    let signed_in = match session {
        Some(session) => match session.get::<SignedInUser>(session_keys::SIGNED_IN_USER).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session, treating caller as signed out");
                None
            }
        },
        None => None,
    };

    match signed_in {
        Some(user) => {
            let ctx: RequestContext = services::enrich(state.profiles(), user).await;
            set_sentry_user(&ctx.email);
            request.extensions_mut().insert(ctx);
        }
        None => clear_sentry_user(),
    }

    next.run(request).await
}
