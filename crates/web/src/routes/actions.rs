//! Form actions.
//!
//! These routes sit outside the route guard. Authorization happens in
//! [`TicketActions`], which checks the caller on every call.

use axum::{
    Form,
    extract::State,
    response::Redirect,
};

use crate::{
    error::AppError,
    middleware::MaybeUser,
    services::{AddCommentForm, AssignTicketForm, CreateTicketForm, TicketActions, UpdateStatusForm},
    state::AppState,
};

fn actions(state: &AppState) -> TicketActions<'_> {
    TicketActions::new(state.tickets(), state.page_cache())
}

/// Create a ticket and show it.
///
/// # Route
///
/// `POST /actions/tickets`
pub async fn create_ticket(
    MaybeUser(ctx): MaybeUser,
    State(state): State<AppState>,
    Form(form): Form<CreateTicketForm>,
) -> Result<Redirect, AppError> {
    let ticket = actions(&state).create_ticket(ctx.as_ref(), form).await?;
    Ok(Redirect::to(&format!("/tickets/{}", ticket.id)))
}

/// Add a comment and return to the ticket.
///
/// # Route
///
/// `POST /actions/comments`
pub async fn add_comment(
    MaybeUser(ctx): MaybeUser,
    State(state): State<AppState>,
    Form(form): Form<AddCommentForm>,
) -> Result<Redirect, AppError> {
    let comment = actions(&state).add_comment(ctx.as_ref(), form).await?;

    let is_admin = ctx.as_ref().is_some_and(|c| c.is_admin());
    let to = if is_admin {
        format!("/admin/tickets/{}", comment.ticket_id)
    } else {
        format!("/tickets/{}", comment.ticket_id)
    };
    Ok(Redirect::to(&to))
}

/// Update a ticket's status.
///
/// # Route
///
/// `POST /actions/tickets/status`
pub async fn update_status(
    MaybeUser(ctx): MaybeUser,
    State(state): State<AppState>,
    Form(form): Form<UpdateStatusForm>,
) -> Result<Redirect, AppError> {
    let ticket = actions(&state).update_status(ctx.as_ref(), form).await?;
    Ok(Redirect::to(&format!("/admin/tickets/{}", ticket.id)))
}

/// Assign a ticket.
///
/// # Route
///
/// `POST /actions/tickets/assign`
pub async fn assign_ticket(
    MaybeUser(ctx): MaybeUser,
    State(state): State<AppState>,
    Form(form): Form<AssignTicketForm>,
) -> Result<Redirect, AppError> {
    let ticket = actions(&state).assign_ticket(ctx.as_ref(), form).await?;
    Ok(Redirect::to(&format!("/admin/tickets/{}", ticket.id)))
}
