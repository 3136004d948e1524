//! Sign-in and sign-out handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use stockroom_core::Backend;
use tower_sessions::Session;
use tracing::instrument;

use super::dashboard::DASHBOARD_PATH;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalSession, TowerSessionSlot, auth::SIGN_IN_PATH};
use crate::services::auth::{self as auth_service, SignInError};
use crate::state::AppState;

/// Sign-in form data.
#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "signin.html")]
pub struct SignInTemplate {
    pub error: Option<&'static str>,
    pub email: String,
}

/// Display the sign-in page, or skip it when already signed in.
pub async fn sign_in_page(OptionalSession(user): OptionalSession) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    SignInTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle sign-in form submission.
///
/// On failure the page is re-rendered with the error and the typed email.
#[instrument(skip_all)]
pub async fn sign_in<B: Backend>(
    State(state): State<AppState<B>>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Response {
    let slot = TowerSessionSlot::new(session);
    let password = SecretString::from(form.password);

    match auth_service::sign_in(state.backend(), &slot, &form.email, &password).await {
        Ok(user) => {
            set_sentry_user(&user.user_id.to_string(), Some(user.email.as_str()));
            Redirect::to(DASHBOARD_PATH).into_response()
        }
        Err(err) => {
            let status = match err {
                SignInError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                SignInError::ProfileUnavailable => StatusCode::BAD_GATEWAY,
                SignInError::Session => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let page = SignInTemplate {
                error: Some(err.user_message()),
                email: form.email,
            };
            (status, page).into_response()
        }
    }
}

/// Sign out and return to the sign-in page.
#[instrument(skip_all)]
pub async fn sign_out<B: Backend>(
    State(state): State<AppState<B>>,
    session: Session,
) -> Result<Redirect, AppError> {
    let slot = TowerSessionSlot::new(session);

    auth_service::sign_out(state.backend(), &slot).await?;
    clear_sentry_user();

    Ok(Redirect::to(SIGN_IN_PATH))
}
