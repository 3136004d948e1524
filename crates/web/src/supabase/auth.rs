//! Password sign-in and sign-out against `auth/v1`.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stockroom_core::{AccessToken, AuthPrincipal, AuthService, Email, ProfileId};
use tracing::instrument;
use uuid::Uuid;

use super::{SupabaseClient, SupabaseError};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
}

impl TokenResponse {
    fn into_principal(self) -> Result<AuthPrincipal, SupabaseError> {
        let user = self
            .user
            .ok_or_else(|| SupabaseError::Unauthorized("no user in token response".to_string()))?;

        Ok(AuthPrincipal {
            id: ProfileId::new(user.id),
            email: user.email.and_then(|e| Email::parse(&e).ok()),
            access_token: AccessToken::new(self.access_token),
        })
    }
}

impl AuthService for SupabaseClient {
    type Error = SupabaseError;

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthPrincipal, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http()
            .post(url)
            .json(&PasswordGrant {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        // GoTrue answers bad credentials with 400 invalid_grant
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(match Self::parse_error(response).await {
                SupabaseError::Api { message, .. } => SupabaseError::Unauthorized(message),
                other => other,
            });
        }

        let token: TokenResponse = Self::handle_response(response).await?;
        token.into_principal()
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/logout")?;

        let response = self
            .http()
            .post(url)
            .bearer_auth(token.expose())
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_into_principal() {
        let body = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {
                "id": "0b3c9f3e-8f0a-4e59-9d2c-6f1f6b8a7c11",
                "email": "admin@toko.id",
                "role": "authenticated"
            }
        }"#;
        let principal = serde_json::from_str::<TokenResponse>(body)
            .unwrap()
            .into_principal()
            .unwrap();

        assert_eq!(
            principal.id.to_string(),
            "0b3c9f3e-8f0a-4e59-9d2c-6f1f6b8a7c11"
        );
        assert_eq!(principal.email.unwrap().as_str(), "admin@toko.id");
        assert_eq!(principal.access_token.expose(), "jwt-token");
    }

    #[test]
    fn test_token_response_without_user_is_rejected() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"t"}"#).unwrap();
        assert!(matches!(
            token.into_principal(),
            Err(SupabaseError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_password_grant_body() {
        let body = serde_json::to_value(PasswordGrant {
            email: "a@b.co",
            password: "hunter2",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"email": "a@b.co", "password": "hunter2"}));
    }
}
