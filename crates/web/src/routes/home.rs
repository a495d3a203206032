//! Home route handler.

use axum::response::Redirect;

use crate::middleware::MaybeUser;

/// Send the caller to their landing page.
///
/// # Route
///
/// `GET /`
pub async fn home(MaybeUser(ctx): MaybeUser) -> Redirect {
    match ctx {
        Some(ctx) if ctx.is_admin() => Redirect::to("/admin"),
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/auth/signin"),
    }
}
