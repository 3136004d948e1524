//! Authentication extractors.
//!
//! Handlers take the signed-in user as an argument instead of reading the
//! session themselves:
//!
//! ```rust,ignore
//! async fn dashboard(RequireSession(user): RequireSession) -> impl IntoResponse {
//!     format!("Hello, {}!", user.display_name())
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use stockroom_core::{SessionSlot, UserSession};
use tower_sessions::Session;

use super::session::TowerSessionSlot;

/// Where unauthenticated requests are sent.
pub const SIGN_IN_PATH: &str = "/signin";

/// Why a gated request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    /// No session; redirect to the sign-in page.
    RedirectToSignIn,
    /// Signed in, but the role may not perform this action.
    Forbidden,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only admins can manage products",
            )
                .into_response(),
        }
    }
}

/// Read the user from the request's session, treating any read error as
/// signed out.
async fn current_user(parts: &Parts) -> Option<UserSession> {
    let session = parts.extensions.get::<Session>()?.clone();

    match TowerSessionSlot::new(session).get().await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session, treating as signed out");
            None
        }
    }
}

/// Extractor that requires a signed-in user.
///
/// Redirects to `/signin` when the session slot is empty.
pub struct RequireSession(pub UserSession);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or(SessionRejection::RedirectToSignIn)
    }
}

/// Extractor that requires a signed-in admin.
///
/// Redirects to `/signin` when signed out, 403 for any other role.
pub struct RequireAdmin(pub UserSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(SessionRejection::RedirectToSignIn)?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.user_id, role = %user.role, "Mutation refused for role");
            return Err(SessionRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalSession(pub Option<UserSession>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_responses() {
        let redirect = SessionRejection::RedirectToSignIn.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers()["location"], SIGN_IN_PATH);

        let forbidden = SessionRejection::Forbidden.into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }
}
