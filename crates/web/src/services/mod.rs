//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Identity bridge (sign-in provisioning) and session enrichment
//! - `tickets` - Ticket actions with per-action authorization

pub mod auth;
pub mod tickets;

pub use auth::{IdentityBridge, SignInError, enrich};
pub use tickets::{
    ActionError, AddCommentForm, AssignTicketForm, CreateTicketForm, TicketActions,
    UpdateStatusForm,
};
