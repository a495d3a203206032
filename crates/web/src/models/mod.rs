//! Domain models for the helpdesk.

pub mod profile;
pub mod session;
pub mod ticket;

pub use profile::{NewProfile, Profile};
pub use session::{RequestContext, SignedInUser, keys as session_keys};
pub use ticket::{Comment, NewComment, NewTicket, StatusCounts, Ticket};
