//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (session database)
//!
//! GET  /                               - Redirect to the dashboard
//!
//! # Auth
//! GET  /signin                         - Sign-in page
//! POST /signin                         - Sign in with email and password
//! POST /signout                        - Sign out
//!
//! # Dashboard (signed in)
//! GET  /dashboard                      - Product list
//! GET  /dashboard?modal=new            - ... with the add modal open (admin)
//! GET  /dashboard?edit=<id>            - ... with the edit modal open (admin)
//! GET  /dashboard?delete=<id>          - ... with the delete confirmation (admin)
//! POST /dashboard/products             - Insert or update a product (admin)
//! POST /dashboard/products/{id}/delete - Delete a product (admin)
//! ```

pub mod auth;
pub mod dashboard;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Redirect,
    routing::{get, post},
};
use stockroom_core::Backend;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Content Security Policy for server-rendered pages (no external assets).
const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; script-src 'none'; style-src 'self' 'unsafe-inline'; frame-ancestors 'none'";

/// Build the application router.
///
/// Tracing and Sentry layers are added by the binary so tests get the bare
/// router.
pub fn build_router<B, S>(state: AppState<B>, session_layer: SessionManagerLayer<S>) -> Router
where
    B: Backend,
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<B>))
        .route("/", get(|| async { Redirect::to(dashboard::DASHBOARD_PATH) }))
        .route("/signin", get(auth::sign_in_page).post(auth::sign_in::<B>))
        .route("/signout", post(auth::sign_out::<B>))
        .route("/dashboard", get(dashboard::show::<B>))
        .route("/dashboard/products", post(dashboard::save::<B>))
        .route(
            "/dashboard/products/{id}/delete",
            post(dashboard::delete::<B>),
        )
        .layer(session_layer)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies session database connectivity when sessions are persisted.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness<B: Backend>(State(state): State<AppState<B>>) -> StatusCode {
    let Some(pool) = state.session_pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Session database not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
