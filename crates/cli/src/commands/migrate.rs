//! Database migration command.
//!
//! ```bash
//! helpdesk-cli migrate
//! ```
//!
//! Applies `crates/web/migrations/`: the `helpdesk` schema (profiles,
//! tickets, comments) and the `tower_sessions` table.

use super::{CommandError, connect};

/// Run all pending helpdesk migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running helpdesk migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Helpdesk migrations complete!");
    Ok(())
}
