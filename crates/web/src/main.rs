//! Stockroom - inventory dashboard.
//!
//! Serves the sign-in page and the product dashboard. Authentication and
//! product storage are delegated to the hosted backend; this binary only
//! keeps browser sessions (in `SQLite`).
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - Supabase auth and REST APIs over `reqwest`
//! - `SQLite`-backed sessions via tower-sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use stockroom_web::config::{LogFormat, WebConfig};
use stockroom_web::middleware::{create_session_layer, spawn_expired_session_sweeper};
use stockroom_web::supabase::SupabaseClient;
use stockroom_web::{AppState, build_router};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged.
const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60);

/// In-flight requests get this long to finish after a TLS shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // rustls needs a process-wide provider before any TLS config is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = WebConfig::from_env().expect("Failed to load configuration");

    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    let (pool, session_store) = open_session_store(&config.session_db_url).await;
    let sweeper = spawn_expired_session_sweeper(session_store.clone(), EXPIRED_SESSION_SWEEP);
    let session_layer = create_session_layer(session_store, config.secure_cookies());

    let backend = SupabaseClient::new(&config.supabase).expect("Failed to create backend client");
    tracing::info!(url = %backend.base_url(), "Backend client created");

    let app = with_observability(build_router(
        AppState::with_session_pool(backend, pool),
        session_layer,
    ));

    serve(&config, app).await;
    sweeper.abort();
}

/// Install the tracing subscriber. Sentry must already be initialized.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockroom_web=info,tower_http=debug".into());

    let (json, text) = match format {
        LogFormat::Json => (
            Some(tracing_subscriber::fmt::layer().json().flatten_event(true)),
            None,
        ),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Open the session database and create the session table if needed.
async fn open_session_store(url: &str) -> (SqlitePool, SqliteStore) {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .expect("Failed to open session database");

    let store = SqliteStore::new(pool.clone());
    store
        .migrate()
        .await
        .expect("Failed to migrate session table");
    tracing::info!("Session store ready");

    (pool, store)
}

/// Per-request spans plus the Sentry hub and transaction layers.
fn with_observability(router: Router) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            DefaultOnResponse::default().on_response(response, latency, span);
        });

    // Sentry goes outermost so the hub covers the whole request
    router
        .layer(trace)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Run until a shutdown signal, over TLS when certificates are configured.
async fn serve(config: &WebConfig, app: Router) {
    let addr = config.socket_addr();

    let Some(tls) = &config.tls else {
        tracing::info!(%addr, "stockroom listening (http)");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind to address");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .expect("Server error");
        return;
    };

    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");

    let handle = Handle::new();
    let on_signal = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!(%addr, "stockroom listening (https)");
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
