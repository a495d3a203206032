//! User ticket pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::instrument;

use helpdesk_core::TicketId;

use super::views::{CommentView, Nav, NavItem, SelectOption, TicketView, priority_options};
use super::{parse_ticket_id, render_cached};
use crate::{
    error::AppError,
    filters,
    middleware::CurrentUser,
    models::{Comment, RequestContext, Ticket},
    state::AppState,
};

/// Create-ticket form.
#[derive(Template, WebTemplate)]
#[template(path = "tickets/create.html")]
pub struct CreateTicketTemplate {
    pub nav: Nav,
    pub priorities: Vec<SelectOption>,
}

/// Ticket detail.
#[derive(Template)]
#[template(path = "tickets/detail.html")]
pub struct TicketDetailTemplate {
    pub nav: Nav,
    pub ticket: TicketView,
    pub comments: Vec<CommentView>,
}

/// Display the create-ticket form.
///
/// # Route
///
/// `GET /tickets/create`
pub async fn create_form(CurrentUser(ctx): CurrentUser) -> CreateTicketTemplate {
    CreateTicketTemplate {
        nav: Nav::new(&ctx, NavItem::CreateTicket),
        priorities: priority_options(),
    }
}

/// Load a ticket and its comments, if `ctx` may see it (owner or admin).
pub(super) async fn load_visible_ticket(
    state: &AppState,
    ctx: &RequestContext,
    id: TicketId,
) -> Result<(Ticket, Vec<Comment>), AppError> {
    let ticket = state
        .tickets()
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))?;

    if !ctx.is_admin() && !ticket.is_owned_by(&ctx.email) {
        return Err(AppError::Forbidden(format!("ticket {id}")));
    }

    let comments = state.tickets().list_comments(id).await?;
    Ok((ticket, comments))
}

/// Ticket detail for its owner (or an admin).
///
/// # Route
///
/// `GET /tickets/{id}`
#[instrument(skip_all, fields(email = %ctx.email, ticket_id = %id))]
pub async fn detail(
    CurrentUser(ctx): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_ticket_id(&id)?;

    let render = async {
        let (ticket, comments) = load_visible_ticket(&state, &ctx, id).await?;

        let page = TicketDetailTemplate {
            nav: Nav::new(&ctx, NavItem::Dashboard),
            ticket: TicketView::from(&ticket),
            comments: comments.iter().map(CommentView::from).collect(),
        };
        Ok::<_, AppError>(page.render()?)
    };

    render_cached(&state, &ctx, format!("/tickets/{id}"), render).await
}
