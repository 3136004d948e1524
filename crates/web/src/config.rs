//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Project URL of the hosted backend (e.g. `https://abc.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key sent as `apikey` on every request
//!
//! ## Optional
//! - `STOCKROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `STOCKROOM_PORT` - Listen port (default: 3000)
//! - `STOCKROOM_BASE_URL` - Public URL; `https://` turns on secure cookies
//!   (default: `http://<host>:<port>`)
//! - `STOCKROOM_SESSION_DB` - `SQLite` URL for session storage
//!   (default: `sqlite://stockroom-sessions.db?mode=rwc`)
//! - `STOCKROOM_LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
//!
//! ## Optional (TLS)
//! - `STOCKROOM_TLS_CERT` - PEM-encoded certificate chain
//! - `STOCKROOM_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SESSION_DB: &str = "sqlite://stockroom-sessions.db?mode=rwc";
const PUBLISHABLE_KEY_PREFIX: &str = "sb_publishable_";

/// Fragments that only show up in copied sample values. Matched lowercase.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-",
    "your_",
    "anon-key",
    "anon_key",
    "changeme",
    "placeholder",
    "<",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// `SQLite` URL of the session store
    pub session_db_url: String,
    /// Hosted backend configuration
    pub supabase: SupabaseConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Hosted backend (Supabase) configuration.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, always ending in `/`
    pub url: Url,
    /// Anon key sent as `apikey`
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl WebConfig {
    /// Read the process environment, after merging a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or unparsable, or when the
    /// anon key is a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`WebConfig::from_env`].
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&get);

        let host = vars
            .or_default("STOCKROOM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOCKROOM_HOST".to_string(), e.to_string()))?;
        let port = vars
            .or_default("STOCKROOM_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOCKROOM_PORT".to_string(), e.to_string()))?;
        let base_url = vars
            .optional("STOCKROOM_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", SocketAddr::new(host, port)));
        let session_db_url = vars.or_default("STOCKROOM_SESSION_DB", DEFAULT_SESSION_DB);

        let supabase = SupabaseConfig::from_vars(&vars)?;

        let log_format = match vars.optional("STOCKROOM_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOCKROOM_LOG_FORMAT".to_string(),
                    format!("expected `text` or `json`, got `{other}`"),
                ));
            }
        };

        let sentry_dsn = vars.optional("SENTRY_DSN");
        let sentry_environment = vars.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = vars
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = vars
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_vars(&vars)?;

        Ok(Self {
            host,
            port,
            base_url,
            session_db_url,
            supabase,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SupabaseConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let raw_url = vars.required("SUPABASE_URL")?;
        let url = parse_project_url(&raw_url)
            .map_err(|reason| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), reason))?;
        let anon_key = vars.required("SUPABASE_ANON_KEY")?;
        check_anon_key(&anon_key)?;

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
        })
    }
}

impl TlsConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Option<Self>, ConfigError> {
        let cert_pem = vars.optional("STOCKROOM_TLS_CERT");
        let key_pem = vars.optional("STOCKROOM_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "STOCKROOM_TLS_*".to_string(),
                "Both STOCKROOM_TLS_CERT and STOCKROOM_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the `from_vars` constructors.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get a required variable. Blank values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Blank values count as missing.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse the project URL and make sure relative joins keep its path.
fn parse_project_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Reject anon keys that are obviously not real.
///
/// Accepted shapes are a signed JWT (three base64url segments) and the newer
/// `sb_publishable_` keys.
fn check_anon_key(key: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| {
        Err(ConfigError::InsecureSecret(
            "SUPABASE_ANON_KEY".to_string(),
            reason,
        ))
    };

    let lower = key.to_ascii_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lower.contains(**m)) {
        return insecure(format!("looks like a placeholder (`{marker}`)"));
    }

    if key.starts_with(PUBLISHABLE_KEY_PREFIX) {
        return Ok(());
    }

    let segments: Vec<&str> = key.split('.').collect();
    let base64url = |seg: &&str| {
        !seg.is_empty()
            && seg
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    };
    if segments.len() != 3 || !segments.iter().all(base64url) {
        return insecure("expected a JWT or an `sb_publishable_` key".to_string());
    }

    Ok(())
}
