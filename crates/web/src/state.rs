//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::PageCache;
use crate::config::{self, HelpdeskConfig};
use crate::db::{PgProfileStore, PgTicketStore, ProfileStore, TicketStore};
use crate::identity::{AzureAdProvider, IdentityProvider};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The stores and the identity
/// provider are trait objects so tests can run the full router against
/// in-memory stores and a fake provider.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    base_url: String,
    profiles: Arc<dyn ProfileStore>,
    tickets: Arc<dyn TicketStore>,
    identity: Arc<dyn IdentityProvider>,
    page_cache: PageCache,
    pool: Option<PgPool>,
}

/// Everything needed to build an [`AppState`].
pub struct StateParts {
    /// Public base URL, without a trailing slash.
    pub base_url: String,
    pub profiles: Arc<dyn ProfileStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub page_cache_ttl: Duration,
    /// Pool for readiness checks; `None` when running without a database.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Create the production state: `PostgreSQL` stores and Entra ID.
    #[must_use]
    pub fn new(config: &HelpdeskConfig, pool: PgPool) -> Self {
        Self::from_parts(StateParts {
            base_url: config.base_url.clone(),
            profiles: Arc::new(PgProfileStore::new(pool.clone())),
            tickets: Arc::new(PgTicketStore::new(pool.clone())),
            identity: Arc::new(AzureAdProvider::new(config.azure.clone())),
            page_cache_ttl: config.page_cache_ttl,
            pool: Some(pool),
        })
    }

    /// Create state from explicit parts.
    #[must_use]
    pub fn from_parts(parts: StateParts) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                base_url: parts.base_url,
                profiles: parts.profiles,
                tickets: parts.tickets,
                identity: parts.identity,
                page_cache: PageCache::new(parts.page_cache_ttl),
                pool: parts.pool,
            }),
        }
    }

    /// Public base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Redirect URI registered with the identity provider.
    #[must_use]
    pub fn oidc_redirect_uri(&self) -> String {
        config::oidc_redirect_uri(&self.inner.base_url)
    }

    /// Get a reference to the profile store.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.inner.profiles.as_ref()
    }

    /// Get a reference to the ticket store.
    #[must_use]
    pub fn tickets(&self) -> &dyn TicketStore {
        self.inner.tickets.as_ref()
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get a reference to the rendered-page cache.
    #[must_use]
    pub fn page_cache(&self) -> &PageCache {
        &self.inner.page_cache
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
