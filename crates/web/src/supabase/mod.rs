//! Client for the hosted backend (Supabase-compatible).
//!
//! Two HTTP APIs sit behind one project URL:
//!
//! - `auth/v1` (`GoTrue`) - password sign-in and sign-out, see [`auth`]
//! - `rest/v1` (`PostgREST`) - table queries, see [`rest`]
//!
//! Every request carries the project's anon key in the `apikey` header.
//! Table queries additionally carry the signed-in user's bearer token so the
//! backend's row-level policies apply.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom_core::{AuthService, QueryService};
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//! let principal = client.sign_in(&email, &password).await?;
//! let products = client.list_products(&principal.access_token).await?;
//! ```

mod auth;
mod rest;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials or token rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A single-row query matched several rows.
    #[error("Expected at most one row from {table}, got {count}")]
    MultipleRows { table: &'static str, count: usize },

    /// The anon key cannot be sent as a header.
    #[error("Invalid header value: {0}")]
    Header(String),
}

/// Hosted backend client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// Error payload shapes used by `GoTrue` and `PostgREST`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the anon key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut apikey = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| SupabaseError::Header(e.to_string()))?;
        apikey.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
            }),
        })
    }

    /// Project base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL below the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Parse a successful JSON response, or turn a failed one into an error.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SupabaseError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| SupabaseError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Accept any 2xx response and discard the body.
    async fn expect_success(response: reqwest::Response) -> Result<(), SupabaseError> {
        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse an error response.
    async fn parse_error(response: reqwest::Response) -> SupabaseError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body
                }
            });

        match status {
            401 | 403 => SupabaseError::Unauthorized(message),
            _ => SupabaseError::Api { status, message },
        }
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
