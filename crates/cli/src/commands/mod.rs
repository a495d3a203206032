//! Subcommand implementations.

pub mod migrate;
pub mod profile;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by every subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Profile store error.
    #[error("Profile store error: {0}")]
    Repository(#[from] helpdesk_web::db::RepositoryError),

    /// Invalid email argument.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] helpdesk_core::EmailError),

    /// Invalid role argument.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// No profile exists for the email.
    #[error("No profile for {0}; the person must sign in once first")]
    ProfileNotFound(String),
}

/// Database URL from `HELPDESK_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("HELPDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar("HELPDESK_DATABASE_URL"))
}

/// Connect to the helpdesk database.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to helpdesk database...");
    Ok(helpdesk_web::db::create_pool(&url).await?)
}
