//! User dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use super::render_cached;
use super::views::{Nav, NavItem, TicketView};
use crate::{error::AppError, filters, middleware::CurrentUser, state::AppState};

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub tickets: Vec<TicketView>,
    pub show_owner: bool,
    pub detail_prefix: &'static str,
}

/// The caller's own tickets, newest first.
///
/// # Route
///
/// `GET /dashboard`
#[instrument(skip_all, fields(email = %ctx.email))]
pub async fn dashboard(
    CurrentUser(ctx): CurrentUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let render = async {
        let tickets = state.tickets().list_by_creator(&ctx.email).await?;

        let page = DashboardTemplate {
            nav: Nav::new(&ctx, NavItem::Dashboard),
            tickets: tickets.iter().map(TicketView::from).collect(),
            show_owner: false,
            detail_prefix: "/tickets/",
        };
        Ok::<_, AppError>(page.render()?)
    };

    render_cached(&state, &ctx, "/dashboard".to_string(), render).await
}
