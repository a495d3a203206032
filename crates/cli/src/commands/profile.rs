//! Profile management commands.
//!
//! Roles are never changed from the web UI; promoting someone to admin is
//! done here.
//!
//! ```bash
//! helpdesk-cli profile list
//! helpdesk-cli profile set-role -e alice@corp.com -r admin
//! ```

use helpdesk_core::{Email, Role};
use helpdesk_web::db::{PgProfileStore, ProfileStore};
use helpdesk_web::models::Profile;

use super::{CommandError, connect};

/// Parse the `--email` and `--role` arguments.
pub fn parse_assignment(email: &str, role: &str) -> Result<(Email, Role), CommandError> {
    let email = Email::parse(email)?;
    let role = role
        .parse::<Role>()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;
    Ok((email, role))
}

/// One line of `profile list` output.
pub fn format_profile(profile: &Profile) -> String {
    format!(
        "{:<6} {} ({})",
        profile.role.as_str(),
        profile.email,
        profile.full_name
    )
}

/// Log every profile, ordered by email.
pub async fn list() -> Result<(), CommandError> {
    let store = PgProfileStore::new(connect().await?);
    let profiles = store.list_profiles().await?;

    tracing::info!("{} profile(s)", profiles.len());
    for profile in &profiles {
        tracing::info!("  {}", format_profile(profile));
    }
    Ok(())
}

/// Change the role of an existing profile.
pub async fn set_role(email: &str, role: &str) -> Result<(), CommandError> {
    let (email, role) = parse_assignment(email, role)?;
    let store = PgProfileStore::new(connect().await?);

    let Some(profile) = store.set_role(&email, role).await? else {
        return Err(CommandError::ProfileNotFound(email.into_inner()));
    };

    tracing::info!(
        "Role updated: {} is now {}",
        profile.email,
        profile.role
    );
    Ok(())
}
