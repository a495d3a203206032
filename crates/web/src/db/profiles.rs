//! `PostgreSQL` profile store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use helpdesk_core::{Email, Role};

use super::{ProfileStore, RepositoryError, parse_stored_email};
use crate::models::{NewProfile, Profile};

/// Raw `helpdesk.profiles` row.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    email: String,
    full_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("profile {}: {e}", row.email))
        })?;

        Ok(Self {
            email: parse_stored_email(&row.email)?,
            full_name: row.full_name,
            role,
            created_at: row.created_at,
        })
    }
}

/// Profile store backed by `helpdesk.profiles`.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Create a new profile store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT email, full_name, role, created_at
            FROM helpdesk.profiles
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn insert_if_absent(&self, profile: &NewProfile) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO helpdesk.profiles (email, full_name, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(profile.email.as_str())
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(email = %email, role = %role))]
    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE helpdesk.profiles
            SET role = $2
            WHERE email = $1
            RETURNING email, full_name, role, created_at
            ",
        )
        .bind(email.as_str())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT email, full_name, role, created_at
            FROM helpdesk.profiles
            ORDER BY email
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Profile::try_from).collect()
    }
}
