//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;
use stockroom_core::Backend;

/// Application state shared across all handlers.
///
/// Generic over the backend so tests can drive the router with an in-memory
/// implementation.
pub struct AppState<B> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B> {
    backend: B,
    session_pool: Option<SqlitePool>,
}

impl<B: Backend> AppState<B> {
    /// State without a session database (in-memory session store).
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                backend,
                session_pool: None,
            }),
        }
    }

    /// Attach the session database so readiness checks can probe it.
    #[must_use]
    pub fn with_session_pool(backend: B, pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                backend,
                session_pool: Some(pool),
            }),
        }
    }

    /// Hosted backend (auth and queries).
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Session database pool, if sessions are persisted.
    #[must_use]
    pub fn session_pool(&self) -> Option<&SqlitePool> {
        self.inner.session_pool.as_ref()
    }
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
