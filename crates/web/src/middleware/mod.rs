//! HTTP middleware for the dashboard.
//!
//! - [`session`] - `SQLite`-backed session layer and the session slot
//! - [`auth`] - Extractors gating routes on the session and role

pub mod auth;
pub mod session;

pub use auth::{OptionalSession, RequireAdmin, RequireSession, SessionRejection};
pub use session::{
    SESSION_COOKIE_NAME, TowerSessionSlot, create_session_layer, keys,
    spawn_expired_session_sweeper,
};
