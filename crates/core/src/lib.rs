//! Stockroom Core - shared types and traits.
//!
//! This crate provides what the `stockroom-web` binary and its tests share:
//!
//! - [`types`] - Validated domain records (emails, ids, prices, products, sessions)
//! - [`backend`] - Traits for the hosted authentication and query services
//! - [`session`] - The single-slot session store contract
//! - [`editor`] - The product modal state machine used by the dashboard
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure state transitions - no
//! I/O, no HTTP clients, no session store. Implementations live in
//! `stockroom-web` (Supabase client, tower-sessions slot) and in the
//! integration tests (in-memory fakes).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod editor;
pub mod session;
pub mod types;

pub use backend::{AuthPrincipal, AuthService, Backend, QueryService};
pub use editor::{FormError, ModalState, ProductEditor, ProductForm, Submission};
pub use session::SessionSlot;
pub use types::*;
