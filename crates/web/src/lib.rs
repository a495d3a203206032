//! IT Helpdesk web application library.
//!
//! The `helpdesk` binary is a thin wrapper over this crate; everything it
//! serves is assembled by [`app::build_router`], so the integration tests
//! drive exactly the same router against in-memory stores.
//!
//! # Layout
//!
//! - [`db`] - Profile and ticket stores (`PostgreSQL` and in-memory)
//! - [`identity`] - Identity provider seam (Azure AD OIDC)
//! - [`services`] - Identity bridge, session enrichment and ticket actions
//! - [`middleware`] - Route guard, extractors, sessions, request ids, headers
//! - [`routes`] - Page and action handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
