//! Session middleware configuration.
//!
//! Sessions live server-side in a `tower-sessions` store (`SQLite` in
//! production, memory in tests); the browser only holds the session id
//! cookie.

use std::time::Duration;

use stockroom_core::{SessionSlot, UserSession};
use tokio::task::JoinHandle;
use tower_sessions::{ExpiredDeletion, Expiry, Session, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "stockroom_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Keys used inside the session record.
pub mod keys {
    /// The signed-in [`UserSession`](stockroom_core::UserSession).
    pub const CURRENT_USER: &str = "current_user";
}

/// Create the session layer over `store`.
///
/// `secure` marks the cookie HTTPS-only; pass
/// [`WebConfig::secure_cookies`](crate::config::WebConfig::secure_cookies).
#[must_use]
pub fn create_session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        // Lax so the redirect after sign-in carries the cookie
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Delete expired session records every `period` until the task is aborted.
///
/// A failed sweep ends the task and is logged.
pub fn spawn_expired_session_sweeper<S>(store: S, period: Duration) -> JoinHandle<()>
where
    S: ExpiredDeletion,
{
    tokio::task::spawn(async move {
        if let Err(err) = store.continuously_delete_expired(period).await {
            tracing::error!(error = %err, "Expired session sweep stopped");
        }
    })
}

/// The per-browser session slot backed by a `tower-sessions` record.
#[derive(Debug, Clone)]
pub struct TowerSessionSlot(pub Session);

impl TowerSessionSlot {
    /// Wrap the request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }
}

impl SessionSlot for TowerSessionSlot {
    type Error = tower_sessions::session::Error;

    async fn get(&self) -> Result<Option<UserSession>, Self::Error> {
        self.0.get(keys::CURRENT_USER).await
    }

    async fn set(&self, session: &UserSession) -> Result<(), Self::Error> {
        // New id on privilege change
        self.0.cycle_id().await?;
        self.0.insert(keys::CURRENT_USER, session).await
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.0.flush().await
    }
}
