//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home redirect by role
//!
//! # Auth
//! GET  /auth/signin                   - Sign-in page
//! GET  /api/auth/signin/azure-ad      - Start OIDC flow
//! GET  /api/auth/callback/azure-ad    - OIDC callback (identity bridge)
//! POST /api/auth/signout              - Sign out
//!
//! # User pages (signed in)
//! GET  /dashboard                     - Caller's tickets
//! GET  /tickets/create                - Create-ticket form
//! GET  /tickets/{id}                  - Ticket detail (owner or admin)
//!
//! # Admin pages
//! GET  /admin                         - Overview
//! GET  /admin/tickets                 - All tickets
//! GET  /admin/tickets/{id}            - Ticket detail with controls
//!
//! # Actions (form posts, self-authorizing)
//! POST /actions/tickets               - Create ticket
//! POST /actions/comments              - Add comment
//! POST /actions/tickets/status        - Update status
//! POST /actions/tickets/assign        - Assign ticket
//! ```

pub mod actions;
pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod tickets;
pub mod views;

use std::future::Future;

use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

use helpdesk_core::TicketId;

use crate::cache::PageKey;
use crate::error::AppError;
use crate::models::RequestContext;
use crate::state::AppState;

/// Page routes.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/auth/signin", get(auth::signin_page))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/tickets/create", get(tickets::create_form))
        .route("/tickets/{id}", get(tickets::detail))
        .route("/admin", get(admin::overview))
        .route("/admin/tickets", get(admin::list))
        .route("/admin/tickets/{id}", get(admin::detail))
}

/// OIDC endpoints.
pub fn auth_api_routes() -> Router<AppState> {
    Router::new()
        .route("/signin/azure-ad", get(auth::start_sign_in))
        .route("/callback/azure-ad", get(auth::callback))
        .route("/signout", post(auth::sign_out))
}

/// Form actions.
pub fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(actions::create_ticket))
        .route("/comments", post(actions::add_comment))
        .route("/tickets/status", post(actions::update_status))
        .route("/tickets/assign", post(actions::assign_ticket))
}

/// Parse a ticket id from a path segment. Anything unparseable is a 404.
fn parse_ticket_id(raw: &str) -> Result<TicketId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("ticket {raw}")))
}

/// Serve `path` for `ctx` from the page cache, rendering it with `render`
/// on a miss.
async fn render_cached<F>(
    state: &AppState,
    ctx: &RequestContext,
    path: String,
    render: F,
) -> Result<Html<String>, AppError>
where
    F: Future<Output = Result<String, AppError>>,
{
    let key = PageKey::new(path, &ctx.email, ctx.role);
    state.page_cache().get_or_render(key, render).await.map(Html)
}
