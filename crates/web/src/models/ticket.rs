//! Ticket and comment domain types.

use chrono::{DateTime, Utc};

use helpdesk_core::{CommentId, Email, TicketId, TicketPriority, TicketStatus};

/// A support ticket (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    /// Owner of the ticket.
    pub created_by: Email,
    pub assigned_to: Option<Email>,
    pub created_at: DateTime<Utc>,
    /// Last status or assignment change.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Whether `email` filed this ticket.
    #[must_use]
    pub fn is_owned_by(&self, email: &Email) -> bool {
        &self.created_by == email
    }
}

/// Validated input for a new ticket. Status is always `Open` on insert.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub created_by: Email,
}

/// A comment on a ticket (domain type). Comments are append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub user_email: Email,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: TicketId,
    pub user_email: Email,
    pub content: String,
}

/// Number of tickets per status, for the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

impl StatusCounts {
    /// Add `count` tickets of `status`.
    pub const fn add(&mut self, status: TicketStatus, count: i64) {
        match status {
            TicketStatus::Open => self.open += count,
            TicketStatus::InProgress => self.in_progress += count,
            TicketStatus::Resolved => self.resolved += count,
        }
    }

    /// Total across all statuses.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.open + self.in_progress + self.resolved
    }
}
