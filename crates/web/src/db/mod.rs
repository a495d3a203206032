//! Database operations for the helpdesk.
//!
//! # Schema: `helpdesk`
//!
//! ## Tables
//!
//! - `profiles` - Email to role and display name; the authorization source of truth
//! - `tickets` - Support tickets
//! - `comments` - Append-only ticket comments
//!
//! Sessions live in `tower_sessions.session`, the session store's own table.
//!
//! # Stores
//!
//! Handlers never touch the pool directly. They go through the
//! [`ProfileStore`] and [`TicketStore`] traits, which have a `PostgreSQL`
//! implementation ([`PgProfileStore`], [`PgTicketStore`]) and an in-memory
//! one ([`MemoryStore`]) used by tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p helpdesk-cli -- migrate
//! ```

pub mod memory;
pub mod profiles;
pub mod tickets;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use helpdesk_core::{Email, Role, TicketId, TicketStatus};

use crate::models::{Comment, NewComment, NewProfile, NewTicket, Profile, StatusCounts, Ticket};

pub use memory::MemoryStore;
pub use profiles::PgProfileStore;
pub use tickets::PgTicketStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found (e.g., a comment on a missing ticket).
    #[error("not found")]
    NotFound,
}

/// Profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Point lookup by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError>;

    /// Insert a profile unless one already exists for the email.
    ///
    /// Returns `true` when a row was created. An existing row is never
    /// modified.
    async fn insert_if_absent(&self, profile: &NewProfile) -> Result<bool, RepositoryError>;

    /// Change a profile's role. Returns the updated profile, or `None` if
    /// no profile exists for the email.
    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<Profile>, RepositoryError>;

    /// All profiles, ordered by email.
    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError>;
}

/// Ticket and comment persistence.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a ticket with status `Open` and return the stored row.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, RepositoryError>;

    /// Point lookup by id.
    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError>;

    /// Tickets filed by `email`, newest first.
    async fn list_by_creator(&self, email: &Email) -> Result<Vec<Ticket>, RepositoryError>;

    /// All tickets, newest first.
    async fn list_all(&self) -> Result<Vec<Ticket>, RepositoryError>;

    /// The `limit` newest tickets.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, RepositoryError>;

    /// Ticket counts per status.
    async fn count_by_status(&self) -> Result<StatusCounts, RepositoryError>;

    /// Set a ticket's status. Returns `None` if the ticket does not exist.
    async fn update_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, RepositoryError>;

    /// Set a ticket's assignee. Returns `None` if the ticket does not exist.
    async fn assign(&self, id: TicketId, assignee: &Email)
    -> Result<Option<Ticket>, RepositoryError>;

    /// Append a comment and return the stored row.
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, RepositoryError>;

    /// Comments on a ticket, oldest first.
    async fn list_comments(&self, ticket_id: TicketId) -> Result<Vec<Comment>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse a stored email, reporting a bad value as data corruption.
pub(crate) fn parse_stored_email(value: &str) -> Result<Email, RepositoryError> {
    Email::parse(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}
