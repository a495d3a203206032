//! Admin pages.
//!
//! The route guard already keeps non-admins out of `/admin`; the
//! [`RequireAdmin`] extractor checks again so a handler can never render
//! admin data for a non-admin.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::instrument;

use super::tickets::load_visible_ticket;
use super::views::{CommentView, Nav, NavItem, SelectOption, TicketView, status_options};
use super::{parse_ticket_id, render_cached};
use crate::{
    error::AppError, filters, middleware::RequireAdmin, models::StatusCounts, state::AppState,
};

/// Number of tickets shown on the overview.
const RECENT_TICKETS: i64 = 5;

/// Ticket links in admin tables go to the admin detail page.
const ADMIN_DETAIL_PREFIX: &str = "/admin/tickets/";

/// Admin overview.
#[derive(Template)]
#[template(path = "admin/overview.html")]
pub struct AdminOverviewTemplate {
    pub nav: Nav,
    pub counts: StatusCounts,
    /// Most recent tickets.
    pub tickets: Vec<TicketView>,
    pub show_owner: bool,
    pub detail_prefix: &'static str,
}

/// All tickets.
#[derive(Template)]
#[template(path = "admin/tickets.html")]
pub struct AdminTicketsTemplate {
    pub nav: Nav,
    pub tickets: Vec<TicketView>,
    pub show_owner: bool,
    pub detail_prefix: &'static str,
}

/// Ticket detail with status, assignment and comment controls.
#[derive(Template)]
#[template(path = "admin/ticket_detail.html")]
pub struct AdminTicketDetailTemplate {
    pub nav: Nav,
    pub ticket: TicketView,
    pub comments: Vec<CommentView>,
    pub statuses: Vec<SelectOption>,
}

/// Ticket counts per status and the most recent tickets.
///
/// # Route
///
/// `GET /admin`
#[instrument(skip_all, fields(email = %ctx.email))]
pub async fn overview(
    RequireAdmin(ctx): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let render = async {
        let (counts, recent) = tokio::join!(
            state.tickets().count_by_status(),
            state.tickets().list_recent(RECENT_TICKETS)
        );

        let page = AdminOverviewTemplate {
            nav: Nav::new(&ctx, NavItem::AdminDashboard),
            counts: counts?,
            tickets: recent?.iter().map(TicketView::from).collect(),
            show_owner: true,
            detail_prefix: ADMIN_DETAIL_PREFIX,
        };
        Ok::<_, AppError>(page.render()?)
    };

    render_cached(&state, &ctx, "/admin".to_string(), render).await
}

/// Every ticket, newest first.
///
/// # Route
///
/// `GET /admin/tickets`
#[instrument(skip_all, fields(email = %ctx.email))]
pub async fn list(
    RequireAdmin(ctx): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let render = async {
        let tickets = state.tickets().list_all().await?;

        let page = AdminTicketsTemplate {
            nav: Nav::new(&ctx, NavItem::ManageTickets),
            tickets: tickets.iter().map(TicketView::from).collect(),
            show_owner: true,
            detail_prefix: ADMIN_DETAIL_PREFIX,
        };
        Ok::<_, AppError>(page.render()?)
    };

    render_cached(&state, &ctx, "/admin/tickets".to_string(), render).await
}

/// Ticket detail with admin controls.
///
/// # Route
///
/// `GET /admin/tickets/{id}`
#[instrument(skip_all, fields(email = %ctx.email, ticket_id = %id))]
pub async fn detail(
    RequireAdmin(ctx): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_ticket_id(&id)?;

    let render = async {
        let (ticket, comments) = load_visible_ticket(&state, &ctx, id).await?;

        let page = AdminTicketDetailTemplate {
            nav: Nav::new(&ctx, NavItem::ManageTickets),
            ticket: TicketView::from(&ticket),
            comments: comments.iter().map(CommentView::from).collect(),
            statuses: status_options(ticket.status),
        };
        Ok::<_, AppError>(page.render()?)
    };

    render_cached(&state, &ctx, format!("/admin/tickets/{id}"), render).await
}
