//! Contracts for the hosted backend.
//!
//! Authentication and table queries are delegated to an external service.
//! `stockroom-web` implements these traits over the Supabase HTTP API; tests
//! implement them in memory.
//!
//! Methods return `impl Future + Send` so callers inside axum handlers stay
//! `Send` without boxing.

use std::future::Future;

use secrecy::SecretString;

use crate::types::{AccessToken, Email, Product, ProductId, ProductInput, Profile, ProfileId};

/// The principal returned by a successful password sign-in.
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    /// Principal id; also the key of the user's `persons` row.
    pub id: ProfileId,
    /// Email on record, if the service returned one.
    pub email: Option<Email>,
    /// Bearer token for subsequent queries.
    pub access_token: AccessToken,
}

/// Password authentication.
pub trait AuthService: Send + Sync {
    /// Error type; only logged by callers.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Exchange credentials for a principal.
    ///
    /// Wrong credentials are an `Err`, not a missing principal.
    fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthPrincipal, Self::Error>> + Send;

    /// Revoke the session behind `token`.
    fn sign_out(&self, token: &AccessToken) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Table queries, executed on behalf of the user holding `token`.
pub trait QueryService: Send + Sync {
    /// Error type; only logged by callers.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the single `persons` row with `id`.
    ///
    /// Returns `Ok(None)` when no row matches and an error when more than one
    /// does.
    fn fetch_profile(
        &self,
        token: &AccessToken,
        id: ProfileId,
    ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send;

    /// All products, newest `created_at` first.
    fn list_products(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;

    /// Insert one product.
    fn insert_product(
        &self,
        token: &AccessToken,
        input: &ProductInput,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Overwrite the product with `id`.
    fn update_product(
        &self,
        token: &AccessToken,
        id: ProductId,
        input: &ProductInput,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete the product with `id`.
    fn delete_product(
        &self,
        token: &AccessToken,
        id: ProductId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Everything the web layer needs from a backend, shareable across requests.
pub trait Backend: AuthService + QueryService + Clone + 'static {}

impl<T> Backend for T where T: AuthService + QueryService + Clone + 'static {}
