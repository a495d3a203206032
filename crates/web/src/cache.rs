//! Rendered-page cache.
//!
//! Read pages are rendered to a `String` and cached per viewer. The viewer's
//! role is part of the key, so a role change never serves a page rendered
//! for the old role. Actions invalidate by path, across all viewers.
//!
//! Each path carries a generation, bumped on invalidation. A render that
//! started before an invalidation is returned to its caller but never
//! cached, so a slow render cannot resurrect data a mutation replaced.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;

use helpdesk_core::{Email, Role, TicketId};

/// Upper bound on cached renders.
const MAX_ENTRIES: u64 = 10_000;

/// Cache key: one render per path per viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub email: Email,
    pub role: Role,
}

impl PageKey {
    #[must_use]
    pub fn new(path: impl Into<String>, email: &Email, role: Role) -> Self {
        Self {
            path: path.into(),
            email: email.clone(),
            role,
        }
    }
}

/// In-memory cache of rendered HTML.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<PageKey, String>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl PageCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self {
            pages,
            generations: Arc::default(),
        }
    }

    /// Current generation of `path`.
    #[must_use]
    pub fn generation(&self, path: &str) -> u64 {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    fn bump(&self, paths: &[String]) {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for path in paths {
            *generations.entry(path.clone()).or_default() += 1;
        }
    }

    /// Cached render for `key`, if still fresh.
    pub async fn get(&self, key: &PageKey) -> Option<String> {
        self.pages.get(key).await
    }

    /// Store a render.
    pub async fn insert(&self, key: PageKey, html: String) {
        self.pages.insert(key, html).await;
    }

    /// Store a render of `key.path` made at generation `seen`, unless the
    /// path has been invalidated since. Returns whether the render is cached.
    pub async fn insert_if_current(&self, key: PageKey, html: String, seen: u64) -> bool {
        if self.generation(&key.path) != seen {
            return false;
        }
        self.pages.insert(key.clone(), html).await;

        // An invalidation that bumped after the check above may have scanned
        // before the insert landed.
        if self.generation(&key.path) != seen {
            self.pages.invalidate(&key).await;
            return false;
        }
        true
    }

    /// Serve `key` from the cache, rendering it with `render` on a miss.
    /// Failed renders are not cached.
    ///
    /// # Errors
    ///
    /// Whatever `render` fails with.
    pub async fn get_or_render<F, E>(&self, key: PageKey, render: F) -> Result<String, E>
    where
        F: Future<Output = Result<String, E>>,
    {
        if let Some(html) = self.get(&key).await {
            tracing::debug!(path = %key.path, "Page cache hit");
            return Ok(html);
        }

        let seen = self.generation(&key.path);
        let html = render.await?;
        let path = key.path.clone();
        if !self.insert_if_current(key, html.clone(), seen).await {
            tracing::debug!(%path, "Page invalidated while rendering, not cached");
        }
        Ok(html)
    }

    /// Drop every cached render of any of `paths`, whoever it was rendered for.
    pub async fn invalidate_paths(&self, paths: &[String]) {
        self.bump(paths);

        let stale: Vec<_> = self
            .pages
            .iter()
            .filter(|(key, _)| paths.iter().any(|p| *p == key.path))
            .map(|(key, _)| key)
            .collect();

        for key in stale {
            self.pages.invalidate(key.as_ref()).await;
        }

        tracing::debug!(?paths, "Invalidated cached pages");
    }

    /// Drop every cached render affected by a change to ticket `id`.
    pub async fn invalidate_ticket(&self, id: TicketId) {
        self.invalidate_paths(&ticket_pages(id)).await;
    }
}

/// Paths whose renders depend on ticket `id`.
#[must_use]
pub fn ticket_pages(id: TicketId) -> [String; 5] {
    [
        "/dashboard".to_string(),
        "/admin".to_string(),
        "/admin/tickets".to_string(),
        format!("/tickets/{id}"),
        format!("/admin/tickets/{id}"),
    ]
}
