//! Integration tests for Stockroom.
//!
//! The real router is driven with `tower::ServiceExt::oneshot`, an in-memory
//! session store and [`FakeBackend`], which records every call so tests can
//! assert exactly which backend operations a request caused.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockroom-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use stockroom_core::{
    AccessToken, AuthPrincipal, AuthService, Email, Price, Product, ProductId, ProductInput,
    Profile, ProfileId, QueryService, Role, SessionSlot, UserSession,
};
use stockroom_web::middleware::create_session_layer;
use stockroom_web::{AppState, build_router};
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

// =============================================================================
// Fake backend
// =============================================================================

/// Error returned by the fakes.
#[derive(Debug, Clone, thiserror::Error)]
#[error("fake backend: {0}")]
pub struct FakeError(pub String);

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SignIn(String),
    SignOut(String),
    FetchProfile(ProfileId),
    ListProducts,
    Insert(ProductInput),
    Update(ProductId, ProductInput),
    Delete(ProductId),
}

struct Account {
    password: String,
    id: ProfileId,
    email: Option<Email>,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, Account>,
    profiles: HashMap<ProfileId, Profile>,
    products: Vec<Product>,
    next_id: i64,
    calls: Vec<Call>,
    fail_profiles: bool,
    fail_list: bool,
    fail_mutations: bool,
}

/// In-memory backend implementing both service traits.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock poisoned")
    }

    /// Register credentials; `role` adds a matching `persons` row.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, role: Option<Role>) -> Self {
        let id = ProfileId::new(Uuid::new_v4());
        {
            let mut state = self.lock();
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    id,
                    email: Email::parse(email).ok(),
                },
            );
            if let Some(role) = role {
                let username = email.split('@').next().map(str::to_string);
                state.profiles.insert(id, Profile { id, username, role });
            }
        }
        self
    }

    /// Like [`with_account`](Self::with_account) but the auth service returns
    /// no email for the principal.
    #[must_use]
    pub fn with_account_without_email(self, email: &str, password: &str, role: Role) -> Self {
        let this = self.with_account(email, password, Some(role));
        if let Some(account) = this.lock().accounts.get_mut(email) {
            account.email = None;
        }
        this
    }

    /// Seed a product; later seeds are newer.
    #[must_use]
    pub fn with_product(self, name: &str, unit_price: &str, quantity: i64) -> Self {
        {
            let mut state = self.lock();
            let input = ProductInput {
                name: name.to_string(),
                unit_price: Price::parse(unit_price).expect("valid seed price"),
                quantity,
            };
            state.push_product(&input);
        }
        self
    }

    /// Make every profile fetch fail.
    #[must_use]
    pub fn failing_profiles(self) -> Self {
        self.lock().fail_profiles = true;
        self
    }

    /// Make every product list fail.
    #[must_use]
    pub fn failing_list(self) -> Self {
        self.lock().fail_list = true;
        self
    }

    /// Make every insert, update and delete fail.
    #[must_use]
    pub fn failing_mutations(self) -> Self {
        self.lock().fail_mutations = true;
        self
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current products, newest first.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().sorted_products()
    }

    /// Principal id registered for `email`.
    #[must_use]
    pub fn principal_id(&self, email: &str) -> Option<ProfileId> {
        self.lock().accounts.get(email).map(|a| a.id)
    }
}

impl FakeState {
    fn push_product(&mut self, input: &ProductInput) -> ProductId {
        self.next_id += 1;
        let id = ProductId::new(self.next_id);
        self.products.push(Product {
            id,
            name: input.name.clone(),
            unit_price: input.unit_price,
            quantity: input.quantity,
        });
        id
    }

    fn sorted_products(&self) -> Vec<Product> {
        let mut products = self.products.clone();
        // ids only grow, so a higher id is a newer row
        products.sort_by(|a, b| b.id.cmp(&a.id));
        products
    }
}

fn token_for(id: ProfileId) -> AccessToken {
    AccessToken::new(format!("token-{id}"))
}

impl AuthService for FakeBackend {
    type Error = FakeError;

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthPrincipal, FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::SignIn(email.to_string()));

        match state.accounts.get(email.as_str()) {
            Some(account) if account.password == password.expose_secret() => Ok(AuthPrincipal {
                id: account.id,
                email: account.email.clone(),
                access_token: token_for(account.id),
            }),
            _ => Err(FakeError("Invalid login credentials".to_string())),
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), FakeError> {
        self.lock()
            .calls
            .push(Call::SignOut(token.expose().to_string()));
        Ok(())
    }
}

impl QueryService for FakeBackend {
    type Error = FakeError;

    async fn fetch_profile(
        &self,
        _token: &AccessToken,
        id: ProfileId,
    ) -> Result<Option<Profile>, FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::FetchProfile(id));
        if state.fail_profiles {
            return Err(FakeError("profile query failed".to_string()));
        }
        Ok(state.profiles.get(&id).cloned())
    }

    async fn list_products(&self, _token: &AccessToken) -> Result<Vec<Product>, FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::ListProducts);
        if state.fail_list {
            return Err(FakeError("list failed".to_string()));
        }
        Ok(state.sorted_products())
    }

    async fn insert_product(
        &self,
        _token: &AccessToken,
        input: &ProductInput,
    ) -> Result<(), FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::Insert(input.clone()));
        if state.fail_mutations {
            return Err(FakeError("insert failed".to_string()));
        }
        state.push_product(input);
        Ok(())
    }

    async fn update_product(
        &self,
        _token: &AccessToken,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::Update(id, input.clone()));
        if state.fail_mutations {
            return Err(FakeError("update failed".to_string()));
        }
        if let Some(product) = state.products.iter_mut().find(|p| p.id == id) {
            product.name.clone_from(&input.name);
            product.unit_price = input.unit_price;
            product.quantity = input.quantity;
        }
        Ok(())
    }

    async fn delete_product(&self, _token: &AccessToken, id: ProductId) -> Result<(), FakeError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete(id));
        if state.fail_mutations {
            return Err(FakeError("delete failed".to_string()));
        }
        state.products.retain(|p| p.id != id);
        Ok(())
    }
}

// =============================================================================
// Fake session slot
// =============================================================================

/// Session slot held in memory, optionally refusing writes.
#[derive(Clone, Default)]
pub struct MemorySlot {
    inner: Arc<Mutex<Option<UserSession>>>,
    fail_writes: bool,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot whose `set` always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Current contents.
    #[must_use]
    pub fn current(&self) -> Option<UserSession> {
        self.inner.lock().expect("slot lock poisoned").clone()
    }
}

impl SessionSlot for MemorySlot {
    type Error = FakeError;

    async fn get(&self) -> Result<Option<UserSession>, FakeError> {
        Ok(self.current())
    }

    async fn set(&self, session: &UserSession) -> Result<(), FakeError> {
        if self.fail_writes {
            return Err(FakeError("session store unavailable".to_string()));
        }
        *self.inner.lock().expect("slot lock poisoned") = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), FakeError> {
        *self.inner.lock().expect("slot lock poisoned") = None;
        Ok(())
    }
}

// =============================================================================
// Router harness
// =============================================================================

/// A response with its body read to a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Assert a 303 redirect to `path`.
    pub fn assert_redirect(&self, path: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location(), Some(path));
    }
}

/// The real router plus a one-browser cookie jar.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub backend: FakeBackend,
}

impl TestApp {
    #[must_use]
    pub fn new(backend: FakeBackend) -> Self {
        let session_layer = create_session_layer(MemoryStore::default(), false);
        let router = build_router(AppState::new(backend.clone()), session_layer);
        Self {
            router,
            cookie: None,
            backend,
        }
    }

    /// A browser already signed in as `email`.
    pub async fn signed_in(backend: FakeBackend, email: &str, password: &str) -> Self {
        let mut app = Self::new(backend);
        app.sign_in(email, password)
            .await
            .assert_redirect("/dashboard");
        app.backend.reset_calls();
        app
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/signin", &[("email", email), ("password", password)])
            .await
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty());
        self.send(request.expect("valid request")).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body));
        self.send(request.expect("valid request")).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            let removed = pair.ends_with('=') || set_cookie.contains("Max-Age=0");
            self.cookie = (!removed).then(|| pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
