//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS class for a ticket status badge.
///
/// Usage in templates: `<span class="badge {{ ticket.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(status: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(status_css(&status.to_string()))
}

/// CSS class for a ticket priority label.
///
/// Usage in templates: `<span class="{{ ticket.priority|priority_class }}">`
#[askama::filter_fn]
pub fn priority_class(
    priority: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(priority_css(&priority.to_string()))
}

fn status_css(status: &str) -> &'static str {
    match status {
        "Open" => "badge-open",
        "In Progress" => "badge-progress",
        "Resolved" => "badge-resolved",
        _ => "badge-unknown",
    }
}

fn priority_css(priority: &str) -> &'static str {
    match priority {
        "High" => "priority-high",
        "Medium" => "priority-medium",
        "Low" => "priority-low",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::{TicketPriority, TicketStatus};

    #[test]
    fn test_every_status_has_a_badge() {
        for status in TicketStatus::ALL {
            assert_ne!(status_css(status.as_str()), "badge-unknown", "{status}");
        }
    }

    #[test]
    fn test_priority_classes() {
        assert_eq!(priority_css(TicketPriority::High.as_str()), "priority-high");
        assert_eq!(priority_css("nonsense"), "");
    }
}
