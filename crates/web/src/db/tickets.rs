//! `PostgreSQL` ticket and comment store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use helpdesk_core::{CommentId, Email, TicketId, TicketPriority, TicketStatus};

use super::{RepositoryError, TicketStore, parse_stored_email};
use crate::models::{Comment, NewComment, NewTicket, StatusCounts, Ticket};

const TICKET_COLUMNS: &str = "id, title, description, priority, status, created_by_email, \
                              assigned_to_email, created_at, updated_at";

/// Raw `helpdesk.tickets` row.
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    title: String,
    description: String,
    priority: String,
    status: String,
    created_by_email: String,
    assigned_to_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let priority = row.priority.parse::<TicketPriority>().map_err(|e| {
            RepositoryError::DataCorruption(format!("ticket {}: {e}", row.id))
        })?;
        let status = row.status.parse::<TicketStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("ticket {}: {e}", row.id))
        })?;
        let assigned_to = row
            .assigned_to_email
            .as_deref()
            .map(parse_stored_email)
            .transpose()?;

        Ok(Self {
            id: TicketId::new(row.id),
            title: row.title,
            description: row.description,
            priority,
            status,
            created_by: parse_stored_email(&row.created_by_email)?,
            assigned_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Raw `helpdesk.comments` row.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    ticket_id: i64,
    user_email: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CommentId::new(row.id),
            ticket_id: TicketId::new(row.ticket_id),
            user_email: parse_stored_email(&row.user_email)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, RepositoryError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

/// Ticket store backed by `helpdesk.tickets` and `helpdesk.comments`.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    /// Create a new ticket store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    #[instrument(skip(self, ticket), fields(created_by = %ticket.created_by))]
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            INSERT INTO helpdesk.tickets (title, description, priority, status, created_by_email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.priority.as_str())
        .bind(TicketStatus::Open.as_str())
        .bind(ticket.created_by.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ticket::try_from(row)
    }

    #[instrument(skip(self))]
    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM helpdesk.tickets WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn list_by_creator(&self, email: &Email) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            SELECT {TICKET_COLUMNS}
            FROM helpdesk.tickets
            WHERE created_by_email = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(email.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_tickets(rows)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM helpdesk.tickets ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_tickets(rows)
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            SELECT {TICKET_COLUMNS}
            FROM helpdesk.tickets
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_tickets(rows)
    }

    #[instrument(skip(self))]
    async fn count_by_status(&self) -> Result<StatusCounts, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM helpdesk.tickets GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status = status.parse::<TicketStatus>().map_err(|e| {
                RepositoryError::DataCorruption(format!("ticket status count: {e}"))
            })?;
            counts.add(status, count);
        }
        Ok(counts)
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            UPDATE helpdesk.tickets
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    #[instrument(skip(self), fields(assignee = %assignee))]
    async fn assign(
        &self,
        id: TicketId,
        assignee: &Email,
    ) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            UPDATE helpdesk.tickets
            SET assigned_to_email = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(id.as_i64())
        .bind(assignee.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    #[instrument(skip(self, comment), fields(ticket_id = %comment.ticket_id))]
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO helpdesk.comments (ticket_id, user_email, content)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, user_email, content, created_at
            ",
        )
        .bind(comment.ticket_id.as_i64())
        .bind(comment.user_email.as_str())
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Comment::try_from(row)
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, ticket_id: TicketId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, ticket_id, user_email, content, created_at
            FROM helpdesk.comments
            WHERE ticket_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(ticket_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> TicketRow {
        TicketRow {
            id: 7,
            title: "Printer broken".to_string(),
            description: "Paper jam on floor 3".to_string(),
            priority: "High".to_string(),
            status: "In Progress".to_string(),
            created_by_email: "a@corp.com".to_string(),
            assigned_to_email: Some("b@corp.com".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ticket_row_conversion() {
        let ticket = Ticket::try_from(row()).unwrap();
        assert_eq!(ticket.id, TicketId::new(7));
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.assigned_to.unwrap().as_str(), "b@corp.com");
    }

    #[test]
    fn test_ticket_row_with_unknown_status_is_corruption() {
        let mut bad = row();
        bad.status = "Closed".to_string();
        assert!(matches!(
            Ticket::try_from(bad),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_ticket_row_without_assignee() {
        let mut unassigned = row();
        unassigned.assigned_to_email = None;
        assert!(Ticket::try_from(unassigned).unwrap().assigned_to.is_none());
    }
}
