//! Ticket actions.
//!
//! Each action re-checks the caller itself, independently of the route
//! guard: authentication and role first, then field validation, then the
//! store. A successful mutation invalidates the cached pages it affects.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use helpdesk_core::{Email, TicketId, TicketPriority, TicketStatus};

use crate::cache::PageCache;
use crate::db::{RepositoryError, TicketStore};
use crate::models::{Comment, NewComment, NewTicket, RequestContext, Ticket};

/// Longest accepted ticket title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Longest accepted ticket description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;
/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 5_000;

/// Errors from ticket actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No signed-in caller.
    #[error("not signed in")]
    Unauthenticated,

    /// Signed in, but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// A field is missing or invalid. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The ticket does not exist.
    #[error("ticket {0} not found")]
    NotFound(TicketId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// `POST /actions/tickets`
#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

/// `POST /actions/comments`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentForm {
    pub ticket_id: Option<String>,
    pub content: Option<String>,
}

/// `POST /actions/tickets/status`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusForm {
    pub ticket_id: Option<String>,
    pub status: Option<String>,
}

/// `POST /actions/tickets/assign`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicketForm {
    pub ticket_id: Option<String>,
    pub assignee_email: Option<String>,
}

/// Trimmed value of a required field.
fn required(value: Option<String>, field: &str) -> Result<String, ActionError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ActionError::Validation(format!("{field} is required")))
}

fn at_most(value: String, field: &str, max_chars: usize) -> Result<String, ActionError> {
    if value.chars().count() > max_chars {
        return Err(ActionError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value)
}

fn ticket_id(value: Option<String>) -> Result<TicketId, ActionError> {
    required(value, "ticket id")?
        .parse()
        .map_err(|_| ActionError::Validation("ticket id is invalid".to_string()))
}

fn signed_in(ctx: Option<&RequestContext>) -> Result<&RequestContext, ActionError> {
    ctx.ok_or(ActionError::Unauthenticated)
}

fn admin(ctx: Option<&RequestContext>) -> Result<&RequestContext, ActionError> {
    let ctx = signed_in(ctx)?;
    if !ctx.is_admin() {
        return Err(ActionError::Forbidden("admin role required"));
    }
    Ok(ctx)
}

/// Mutating ticket operations.
pub struct TicketActions<'a> {
    tickets: &'a dyn TicketStore,
    cache: &'a PageCache,
}

impl<'a> TicketActions<'a> {
    /// Create a new ticket action service.
    #[must_use]
    pub const fn new(tickets: &'a dyn TicketStore, cache: &'a PageCache) -> Self {
        Self { tickets, cache }
    }

    /// File a ticket as the caller. Status is always `Open`.
    ///
    /// # Errors
    ///
    /// - `ActionError::Unauthenticated` without a caller
    /// - `ActionError::Validation` if title, description or priority is
    ///   missing or invalid
    /// - `ActionError::Repository` if the insert fails
    #[instrument(skip_all)]
    pub async fn create_ticket(
        &self,
        ctx: Option<&RequestContext>,
        form: CreateTicketForm,
    ) -> Result<Ticket, ActionError> {
        let ctx = signed_in(ctx)?;

        let title = at_most(required(form.title, "title")?, "title", MAX_TITLE_CHARS)?;
        let description = at_most(
            required(form.description, "description")?,
            "description",
            MAX_DESCRIPTION_CHARS,
        )?;
        let priority: TicketPriority = required(form.priority, "priority")?
            .parse()
            .map_err(|_| ActionError::Validation("priority is invalid".to_string()))?;

        let ticket = self
            .tickets
            .create_ticket(&NewTicket {
                title,
                description,
                priority,
                created_by: ctx.email.clone(),
            })
            .await?;

        tracing::info!(ticket_id = %ticket.id, created_by = %ctx.email, %priority, "Ticket created");
        self.cache.invalidate_ticket(ticket.id).await;

        Ok(ticket)
    }

    /// Append a comment. Only the ticket's owner or an admin may comment.
    ///
    /// # Errors
    ///
    /// - `ActionError::Unauthenticated` without a caller
    /// - `ActionError::Validation` if ticket id or content is missing
    /// - `ActionError::NotFound` if the ticket does not exist
    /// - `ActionError::Forbidden` if the caller neither owns the ticket nor
    ///   is an admin
    /// - `ActionError::Repository` on storage failure
    #[instrument(skip_all)]
    pub async fn add_comment(
        &self,
        ctx: Option<&RequestContext>,
        form: AddCommentForm,
    ) -> Result<Comment, ActionError> {
        let ctx = signed_in(ctx)?;

        let ticket_id = ticket_id(form.ticket_id)?;
        let content = at_most(required(form.content, "content")?, "content", MAX_COMMENT_CHARS)?;

        let ticket = self
            .tickets
            .get_ticket(ticket_id)
            .await?
            .ok_or(ActionError::NotFound(ticket_id))?;

        if !ctx.is_admin() && !ticket.is_owned_by(&ctx.email) {
            return Err(ActionError::Forbidden("only the ticket owner or an admin may comment"));
        }

        let comment = self
            .tickets
            .add_comment(&NewComment {
                ticket_id,
                user_email: ctx.email.clone(),
                content,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ActionError::NotFound(ticket_id),
                other => ActionError::Repository(other),
            })?;

        tracing::info!(%ticket_id, comment_id = %comment.id, author = %ctx.email, "Comment added");
        self.cache.invalidate_ticket(ticket_id).await;

        Ok(comment)
    }

    /// Set a ticket's status. Admin only.
    ///
    /// # Errors
    ///
    /// - `ActionError::Unauthenticated` / `Forbidden` unless an admin calls
    /// - `ActionError::Validation` if ticket id or status is missing or invalid
    /// - `ActionError::NotFound` if the ticket does not exist
    /// - `ActionError::Repository` on storage failure
    #[instrument(skip_all)]
    pub async fn update_status(
        &self,
        ctx: Option<&RequestContext>,
        form: UpdateStatusForm,
    ) -> Result<Ticket, ActionError> {
        let ctx = admin(ctx)?;

        let ticket_id = ticket_id(form.ticket_id)?;
        let status: TicketStatus = required(form.status, "status")?
            .parse()
            .map_err(|_| ActionError::Validation("status is invalid".to_string()))?;

        let ticket = self
            .tickets
            .update_status(ticket_id, status)
            .await?
            .ok_or(ActionError::NotFound(ticket_id))?;

        tracing::info!(%ticket_id, %status, admin = %ctx.email, "Ticket status updated");
        self.cache.invalidate_ticket(ticket_id).await;

        Ok(ticket)
    }

    /// Assign a ticket. Admin only. Last write wins.
    ///
    /// # Errors
    ///
    /// - `ActionError::Unauthenticated` / `Forbidden` unless an admin calls
    /// - `ActionError::Validation` if ticket id or assignee email is missing
    ///   or invalid
    /// - `ActionError::NotFound` if the ticket does not exist
    /// - `ActionError::Repository` on storage failure
    #[instrument(skip_all)]
    pub async fn assign_ticket(
        &self,
        ctx: Option<&RequestContext>,
        form: AssignTicketForm,
    ) -> Result<Ticket, ActionError> {
        let ctx = admin(ctx)?;

        let ticket_id = ticket_id(form.ticket_id)?;
        let assignee = Email::parse(&required(form.assignee_email, "assignee email")?)
            .map_err(|e| ActionError::Validation(format!("assignee email is invalid: {e}")))?;

        let ticket = self
            .tickets
            .assign(ticket_id, &assignee)
            .await?
            .ok_or(ActionError::NotFound(ticket_id))?;

        tracing::info!(%ticket_id, %assignee, admin = %ctx.email, "Ticket assigned");
        self.cache.invalidate_ticket(ticket_id).await;

        Ok(ticket)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use helpdesk_core::Role;

    use super::*;
    use crate::cache::PageKey;
    use crate::db::MemoryStore;

    fn ctx(email: &str, role: Role) -> RequestContext {
        RequestContext {
            email: Email::parse(email).unwrap(),
            name: None,
            role,
        }
    }

    fn create_form(title: &str, description: &str, priority: &str) -> CreateTicketForm {
        CreateTicketForm {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            priority: Some(priority.to_string()),
        }
    }

    struct Fixture {
        store: MemoryStore,
        cache: PageCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                cache: PageCache::new(Duration::from_secs(60)),
            }
        }

        fn actions(&self) -> TicketActions<'_> {
            TicketActions::new(&self.store, &self.cache)
        }

        async fn ticket_by(&self, owner: &RequestContext) -> Ticket {
            self.actions()
                .create_ticket(Some(owner), create_form("Printer broken", "Paper jam", "High"))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_create_ticket_is_open_and_owned_by_caller() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);

        let ticket = fx.ticket_by(&alice).await;
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.created_by, alice.email);
        assert!(ticket.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_create_ticket_rejects_missing_fields() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);

        let forms = [
            CreateTicketForm { title: None, ..create_form("", "d", "Low") },
            create_form("   ", "d", "Low"),
            CreateTicketForm { description: None, ..create_form("t", "", "Low") },
            CreateTicketForm { priority: None, ..create_form("t", "d", "") },
            create_form("t", "d", "Urgent"),
        ];

        for form in forms {
            let result = fx.actions().create_ticket(Some(&alice), form).await;
            assert!(matches!(result, Err(ActionError::Validation(_))));
        }
        assert_eq!(fx.store.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_ticket_enforces_length_limits() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);

        let long_title = "x".repeat(MAX_TITLE_CHARS + 1);
        let result = fx
            .actions()
            .create_ticket(Some(&alice), create_form(&long_title, "d", "Low"))
            .await;
        assert!(matches!(result, Err(ActionError::Validation(_))));

        let max_title = "é".repeat(MAX_TITLE_CHARS);
        let result = fx
            .actions()
            .create_ticket(Some(&alice), create_form(&max_title, "d", "Low"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unauthenticated_checked_before_validation() {
        let fx = Fixture::new();

        let result = fx.actions().create_ticket(None, CreateTicketForm::default()).await;
        assert!(matches!(result, Err(ActionError::Unauthenticated)));

        let result = fx.actions().add_comment(None, AddCommentForm::default()).await;
        assert!(matches!(result, Err(ActionError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_status_and_assignment_require_admin() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);
        let ticket = fx.ticket_by(&alice).await;

        let result = fx
            .actions()
            .update_status(
                Some(&alice),
                UpdateStatusForm {
                    ticket_id: Some(ticket.id.to_string()),
                    status: Some("Resolved".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ActionError::Forbidden(_))));

        let result = fx
            .actions()
            .assign_ticket(
                Some(&alice),
                AssignTicketForm {
                    ticket_id: Some(ticket.id.to_string()),
                    assignee_email: Some("alice@corp.com".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ActionError::Forbidden(_))));

        // Role is checked before fields.
        let result = fx.actions().update_status(Some(&alice), UpdateStatusForm::default()).await;
        assert!(matches!(result, Err(ActionError::Forbidden(_))));

        let unchanged = fx.store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(unchanged, ticket);
    }

    #[tokio::test]
    async fn test_status_validation() {
        let fx = Fixture::new();
        let admin = ctx("admin@corp.com", Role::Admin);
        let ticket = fx.ticket_by(&ctx("alice@corp.com", Role::User)).await;

        for (id, status) in [
            (None, Some("Resolved")),
            (Some("abc"), Some("Resolved")),
            (Some("1"), None),
            (Some("1"), Some("Closed")),
        ] {
            let result = fx
                .actions()
                .update_status(
                    Some(&admin),
                    UpdateStatusForm {
                        ticket_id: id.map(String::from),
                        status: status.map(String::from),
                    },
                )
                .await;
            assert!(matches!(result, Err(ActionError::Validation(_))), "{id:?} {status:?}");
        }

        let result = fx
            .actions()
            .update_status(
                Some(&admin),
                UpdateStatusForm {
                    ticket_id: Some("999".to_string()),
                    status: Some("Resolved".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ActionError::NotFound(_))));

        let unchanged = fx.store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn test_printer_scenario() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);
        let admin = ctx("admin@corp.com", Role::Admin);
        let other_admin = ctx("lead@corp.com", Role::Admin);

        let ticket = fx.ticket_by(&alice).await;
        let id = ticket.id.to_string();

        fx.actions()
            .update_status(
                Some(&admin),
                UpdateStatusForm {
                    ticket_id: Some(id.clone()),
                    status: Some("In Progress".to_string()),
                },
            )
            .await
            .unwrap();
        fx.actions()
            .assign_ticket(
                Some(&admin),
                AssignTicketForm {
                    ticket_id: Some(id.clone()),
                    assignee_email: Some("bob@corp.com".to_string()),
                },
            )
            .await
            .unwrap();

        let read = fx.store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(read.status, TicketStatus::InProgress);
        assert_eq!(read.assigned_to.as_ref().map(Email::as_str), Some("bob@corp.com"));

        fx.actions()
            .add_comment(
                Some(&alice),
                AddCommentForm {
                    ticket_id: Some(id.clone()),
                    content: Some("Still broken".to_string()),
                },
            )
            .await
            .unwrap();

        let last = fx
            .actions()
            .assign_ticket(
                Some(&other_admin),
                AssignTicketForm {
                    ticket_id: Some(id),
                    assignee_email: Some("carol@corp.com".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(last.assigned_to.as_ref().map(Email::as_str), Some("carol@corp.com"));
    }

    #[tokio::test]
    async fn test_comment_requires_owner_or_admin() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);
        let mallory = ctx("mallory@corp.com", Role::User);
        let admin = ctx("admin@corp.com", Role::Admin);
        let ticket = fx.ticket_by(&alice).await;

        let form = |content: &str| AddCommentForm {
            ticket_id: Some(ticket.id.to_string()),
            content: Some(content.to_string()),
        };

        let result = fx.actions().add_comment(Some(&mallory), form("hi")).await;
        assert!(matches!(result, Err(ActionError::Forbidden(_))));

        fx.actions().add_comment(Some(&alice), form("first")).await.unwrap();
        fx.actions().add_comment(Some(&admin), form("second")).await.unwrap();

        let comments = fx.store.list_comments(ticket.id).await.unwrap();
        let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_comment_validation_and_missing_ticket() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);

        let result = fx
            .actions()
            .add_comment(
                Some(&alice),
                AddCommentForm {
                    ticket_id: Some("1".to_string()),
                    content: Some("  ".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ActionError::Validation(_))));

        let result = fx
            .actions()
            .add_comment(
                Some(&alice),
                AddCommentForm {
                    ticket_id: Some("42".to_string()),
                    content: Some("hello".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ActionError::NotFound(id)) if id == TicketId::new(42)));
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cached_pages() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);
        let admin = ctx("admin@corp.com", Role::Admin);
        let ticket = fx.ticket_by(&alice).await;

        let key = PageKey::new(format!("/tickets/{}", ticket.id), &alice.email, Role::User);
        fx.cache.insert(key.clone(), "stale".to_string()).await;

        fx.actions()
            .update_status(
                Some(&admin),
                UpdateStatusForm {
                    ticket_id: Some(ticket.id.to_string()),
                    status: Some("Resolved".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(fx.cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let fx = Fixture::new();
        let alice = ctx("alice@corp.com", Role::User);
        fx.store.set_unavailable(true);

        let result = fx
            .actions()
            .create_ticket(Some(&alice), create_form("t", "d", "Low"))
            .await;
        assert!(matches!(result, Err(ActionError::Repository(_))));
    }
}
