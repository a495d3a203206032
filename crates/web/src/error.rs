//! Unified error handling for the helpdesk.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use helpdesk_core::Email;

use crate::db::RepositoryError;
use crate::filters;
use crate::services::ActionError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No signed-in caller.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Unauthenticated => Self::Unauthenticated,
            ActionError::Forbidden(reason) => Self::Forbidden(reason.to_string()),
            ActionError::Validation(message) => Self::BadRequest(message),
            ActionError::NotFound(id) => Self::NotFound(format!("ticket {id}")),
            ActionError::Repository(e) => Self::Database(e),
        }
    }
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    title: &'a str,
    message: &'a str,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Title and message safe to show to the caller.
    fn public_message(&self) -> (&'static str, String) {
        match self {
            Self::Database(_) | Self::Template(_) | Self::Internal(_) => (
                "Something went wrong",
                "The request could not be completed. Please try again later.".to_string(),
            ),
            Self::NotFound(_) => (
                "Not found",
                "The page or ticket you asked for does not exist.".to_string(),
            ),
            Self::Unauthenticated => ("Sign in required", "Please sign in.".to_string()),
            Self::Forbidden(_) => (
                "Not authorized",
                "You are not authorized to view or change this.".to_string(),
            ),
            Self::BadRequest(message) => ("Invalid request", message.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Unauthenticated) {
            return Redirect::to("/auth/signin").into_response();
        }

        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Template(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Helpdesk request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let (title, message) = self.public_message();

        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message: &message,
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error page");
                (status, message).into_response()
            }
        }
    }
}

/// Set the Sentry user context for the signed-in caller.
pub fn set_sentry_user(email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
