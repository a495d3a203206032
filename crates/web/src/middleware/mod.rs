//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Session context (enrichment, application routes only)
//! 7. Route guard (page routes only)

pub mod auth;
pub mod context;
pub mod guard;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, CurrentUser, MaybeUser, RequireAdmin};
pub use context::session_context;
pub use guard::{GuardDecision, PathClass, classify, decide, route_guard, sign_in_url};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
