//! IT Helpdesk Core - Shared domain types.
//!
//! This crate provides the types used across all helpdesk components:
//! - `web` - Server-rendered ticketing application
//! - `cli` - Command-line tools for migrations and profile management
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature enabled, the newtypes
//! gain `sqlx` encode/decode support.
//!
//! # Modules
//!
//! - [`types`] - Emails, roles, ticket statuses/priorities and typed IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
