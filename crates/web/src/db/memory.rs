//! In-memory implementation of both stores.
//!
//! Used by unit and integration tests, and handy for local UI work. Behaves
//! like the `PostgreSQL` stores: ids are sequential, lists are ordered the
//! same way, and `insert_if_absent` never overwrites.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use helpdesk_core::{CommentId, Email, Role, TicketId, TicketStatus};

use super::{ProfileStore, RepositoryError, TicketStore};
use crate::models::{Comment, NewComment, NewProfile, NewTicket, Profile, StatusCounts, Ticket};

#[derive(Default)]
struct Tables {
    profiles: BTreeMap<Email, Profile>,
    tickets: Vec<Ticket>,
    comments: Vec<Comment>,
    next_ticket_id: i64,
    next_comment_id: i64,
}

/// Profile and ticket store held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a database error (or
    /// succeed again), to exercise storage-failure paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored profiles.
    pub async fn profile_count(&self) -> usize {
        self.tables.read().await.profiles.len()
    }

    /// Number of stored tickets.
    pub async fn ticket_count(&self) -> usize {
        self.tables.read().await.tickets.len()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn newest_first(mut tickets: Vec<Ticket>) -> Vec<Ticket> {
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    tickets
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        self.check()?;
        Ok(self.tables.read().await.profiles.get(email).cloned())
    }

    async fn insert_if_absent(&self, profile: &NewProfile) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&profile.email) {
            return Ok(false);
        }
        tables.profiles.insert(
            profile.email.clone(),
            Profile {
                email: profile.email.clone(),
                full_name: profile.full_name.clone(),
                role: profile.role,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<Option<Profile>, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Ok(tables.profiles.get_mut(email).map(|profile| {
            profile.role = role;
            profile.clone()
        }))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        self.check()?;
        Ok(self.tables.read().await.profiles.values().cloned().collect())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        tables.next_ticket_id += 1;
        let now = Utc::now();
        let stored = Ticket {
            id: TicketId::new(tables.next_ticket_id),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority,
            status: TicketStatus::Open,
            created_by: ticket.created_by.clone(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };
        tables.tickets.push(stored.clone());
        Ok(stored)
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_creator(&self, email: &Email) -> Result<Vec<Ticket>, RepositoryError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mine = tables
            .tickets
            .iter()
            .filter(|t| t.is_owned_by(email))
            .cloned()
            .collect();
        Ok(newest_first(mine))
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        self.check()?;
        Ok(newest_first(self.tables.read().await.tickets.clone()))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, RepositoryError> {
        self.check()?;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let mut tickets = newest_first(self.tables.read().await.tickets.clone());
        tickets.truncate(limit);
        Ok(tickets)
    }

    async fn count_by_status(&self) -> Result<StatusCounts, RepositoryError> {
        self.check()?;
        let mut counts = StatusCounts::default();
        for ticket in &self.tables.read().await.tickets {
            counts.add(ticket.status, 1);
        }
        Ok(counts)
    }

    async fn update_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Ok(tables.tickets.iter_mut().find(|t| t.id == id).map(|t| {
            t.status = status;
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn assign(
        &self,
        id: TicketId,
        assignee: &Email,
    ) -> Result<Option<Ticket>, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Ok(tables.tickets.iter_mut().find(|t| t.id == id).map(|t| {
            t.assigned_to = Some(assignee.clone());
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.tickets.iter().any(|t| t.id == comment.ticket_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.next_comment_id += 1;
        let stored = Comment {
            id: CommentId::new(tables.next_comment_id),
            ticket_id: comment.ticket_id,
            user_email: comment.user_email.clone(),
            content: comment.content.clone(),
            created_at: Utc::now(),
        };
        tables.comments.push(stored.clone());
        Ok(stored)
    }

    async fn list_comments(&self, ticket_id: TicketId) -> Result<Vec<Comment>, RepositoryError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use helpdesk_core::TicketPriority;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn new_ticket(title: &str, by: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: "details".to_string(),
            priority: TicketPriority::Medium,
            created_by: email(by),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_never_overwrites() {
        let store = MemoryStore::new();
        let first = NewProfile::first_sign_in(email("a@corp.com"), Some("Alice"));
        assert!(store.insert_if_absent(&first).await.unwrap());

        store.set_role(&email("a@corp.com"), Role::Admin).await.unwrap();

        let again = NewProfile::first_sign_in(email("a@corp.com"), Some("Someone Else"));
        assert!(!store.insert_if_absent(&again).await.unwrap());

        let stored = store.find_by_email(&email("a@corp.com")).await.unwrap().unwrap();
        assert_eq!(stored.full_name, "Alice");
        assert_eq!(stored.role, Role::Admin);
        assert_eq!(store.profile_count().await, 1);
    }

    #[tokio::test]
    async fn test_tickets_listed_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_ticket(&new_ticket("one", "a@corp.com")).await.unwrap();
        let second = store.create_ticket(&new_ticket("two", "a@corp.com")).await.unwrap();
        store.create_ticket(&new_ticket("three", "b@corp.com")).await.unwrap();

        let mine = store.list_by_creator(&email("a@corp.com")).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "three");
    }

    #[tokio::test]
    async fn test_comments_oldest_first_and_require_ticket() {
        let store = MemoryStore::new();
        let ticket = store.create_ticket(&new_ticket("one", "a@corp.com")).await.unwrap();

        for content in ["first", "second"] {
            store
                .add_comment(&NewComment {
                    ticket_id: ticket.id,
                    user_email: email("a@corp.com"),
                    content: content.to_string(),
                })
                .await
                .unwrap();
        }

        let comments = store.list_comments(ticket.id).await.unwrap();
        let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);

        let orphan = store
            .add_comment(&NewComment {
                ticket_id: TicketId::new(999),
                user_email: email("a@corp.com"),
                content: "lost".to_string(),
            })
            .await;
        assert!(matches!(orphan, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let store = MemoryStore::new();
        let t1 = store.create_ticket(&new_ticket("one", "a@corp.com")).await.unwrap();
        store.create_ticket(&new_ticket("two", "a@corp.com")).await.unwrap();
        store
            .update_status(t1.id, TicketStatus::Resolved)
            .await
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.open, 1);
        assert_eq!(counts.in_progress, 0);
        assert_eq!(counts.resolved, 1);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.find_by_email(&email("a@corp.com")).await,
            Err(RepositoryError::Database(_))
        ));
        store.set_unavailable(false);
        assert!(store.find_by_email(&email("a@corp.com")).await.unwrap().is_none());
    }
}
