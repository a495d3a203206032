//! Core types for the helpdesk.
//!
//! Every value that crosses a trust boundary (form input, identity
//! assertion, database row) is parsed into one of these types first.

pub mod email;
pub mod id;
pub mod role;
pub mod ticket;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Role, RoleError};
pub use ticket::{TicketPriority, TicketPriorityError, TicketStatus, TicketStatusError};
