//! View models shared by the page templates.
//!
//! Everything is pre-formatted here so templates only print strings.

use chrono::{DateTime, Utc};

use helpdesk_core::{TicketPriority, TicketStatus};

use crate::models::{Comment, RequestContext, Ticket};

/// Navigation bar entry that is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Dashboard,
    CreateTicket,
    AdminDashboard,
    ManageTickets,
}

/// Navigation bar, filtered by role.
#[derive(Debug, Clone)]
pub struct Nav {
    pub email: String,
    pub display_name: String,
    pub initial: String,
    pub is_admin: bool,
    pub active: &'static str,
}

impl Nav {
    #[must_use]
    pub fn new(ctx: &RequestContext, active: NavItem) -> Self {
        Self {
            email: ctx.email.to_string(),
            display_name: ctx.display_name().to_string(),
            initial: ctx.email.initial().to_string(),
            is_admin: ctx.is_admin(),
            active: match active {
                NavItem::Dashboard => "dashboard",
                NavItem::CreateTicket => "create",
                NavItem::AdminDashboard => "admin",
                NavItem::ManageTickets => "manage",
            },
        }
    }
}

/// Format a timestamp for display.
#[must_use]
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Ticket for list and detail pages.
#[derive(Debug, Clone)]
pub struct TicketView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: &'static str,
    pub status: &'static str,
    pub created_by: String,
    pub assigned_to: String,
    pub is_assigned: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Ticket> for TicketView {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority.as_str(),
            status: ticket.status.as_str(),
            created_by: ticket.created_by.to_string(),
            assigned_to: ticket
                .assigned_to
                .as_ref()
                .map_or_else(|| "Unassigned".to_string(), ToString::to_string),
            is_assigned: ticket.assigned_to.is_some(),
            created_at: format_timestamp(&ticket.created_at),
            updated_at: format_timestamp(&ticket.updated_at),
        }
    }
}

/// Comment for detail pages.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub author: String,
    pub initial: String,
    pub content: String,
    pub created_at: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            author: comment.user_email.to_string(),
            initial: comment.user_email.initial().to_string(),
            content: comment.content.clone(),
            created_at: format_timestamp(&comment.created_at),
        }
    }
}

/// `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Status options with the ticket's current status selected.
#[must_use]
pub fn status_options(current: TicketStatus) -> Vec<SelectOption> {
    TicketStatus::ALL
        .iter()
        .map(|status| SelectOption {
            value: status.as_str(),
            selected: *status == current,
        })
        .collect()
}

/// Priority options with the default priority selected.
#[must_use]
pub fn priority_options() -> Vec<SelectOption> {
    TicketPriority::ALL
        .iter()
        .map(|priority| SelectOption {
            value: priority.as_str(),
            selected: *priority == TicketPriority::default(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use helpdesk_core::{Email, Role, TicketId};

    #[test]
    fn test_ticket_view_unassigned() {
        let now = Utc::now();
        let ticket = Ticket {
            id: TicketId::new(12),
            title: "VPN down".to_string(),
            description: "Cannot connect".to_string(),
            priority: TicketPriority::High,
            status: TicketStatus::InProgress,
            created_by: Email::parse("a@corp.com").unwrap(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };

        let view = TicketView::from(&ticket);
        assert_eq!(view.id, "12");
        assert_eq!(view.status, "In Progress");
        assert_eq!(view.assigned_to, "Unassigned");
        assert!(!view.is_assigned);
    }

    #[test]
    fn test_nav_for_admin() {
        let ctx = RequestContext {
            email: Email::parse("boss@corp.com").unwrap(),
            name: Some("The Boss".to_string()),
            role: Role::Admin,
        };
        let nav = Nav::new(&ctx, NavItem::ManageTickets);
        assert!(nav.is_admin);
        assert_eq!(nav.display_name, "The Boss");
        assert_eq!(nav.initial, "B");
        assert_eq!(nav.active, "manage");
    }

    #[test]
    fn test_status_options_select_current() {
        let options = status_options(TicketStatus::Resolved);
        let selected: Vec<_> = options.iter().filter(|o| o.selected).map(|o| o.value).collect();
        assert_eq!(selected, ["Resolved"]);
    }
}
