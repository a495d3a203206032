//! Ticket status and priority.
//!
//! Both are closed sets stored as their display text, so the database
//! column reads the same as the badge in the UI.

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not one of the known statuses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ticket status: {0}")]
pub struct TicketStatusError(pub String);

/// Error returned when a priority string is not one of the known priorities.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ticket priority: {0}")]
pub struct TicketPriorityError(pub String);

/// Lifecycle state of a ticket.
///
/// Any status may move to any other; there is no enforced ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl TicketStatus {
    /// All statuses, in the order they appear in the admin status selector.
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Resolved];

    /// Returns the stored text form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = TicketStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Open" => Ok(Self::Open),
            "In Progress" => Ok(Self::InProgress),
            "Resolved" => Ok(Self::Resolved),
            other => Err(TicketStatusError(other.to_owned())),
        }
    }
}

/// Urgency chosen by the ticket's creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    /// All priorities, in the order they appear in the create form.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the stored text form of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = TicketPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(TicketPriorityError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("Open".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert_eq!(
            "In Progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            "Resolved".parse::<TicketStatus>().unwrap(),
            TicketStatus::Resolved
        );
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        assert_eq!(
            "Closed".parse::<TicketStatus>(),
            Err(TicketStatusError("Closed".to_owned()))
        );
        assert!("in progress".parse::<TicketStatus>().is_err());
        assert!("InProgress".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_status_text_matches_storage_form() {
        for status in TicketStatus::ALL {
            assert_eq!(status.to_string().parse::<TicketStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("High".parse::<TicketPriority>().unwrap(), TicketPriority::High);
        assert!("Urgent".parse::<TicketPriority>().is_err());
        assert!("".parse::<TicketPriority>().is_err());
    }
}
