//! Stockroom web library.
//!
//! The dashboard is built as a library so the router can be driven by tests
//! with an in-memory backend; `main.rs` only wires configuration, logging and
//! the listener.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`supabase`] - HTTP client for the hosted auth and query services
//! - [`middleware`] - Session layer, session slot and auth extractors
//! - [`services`] - Sign-in flow and inventory operations
//! - [`routes`] - Handlers and templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;

pub use routes::build_router;
pub use state::AppState;
