//! Sign-in and sign-out flows.
//!
//! Sign-in is three steps (authenticate, fetch the profile, persist the
//! session). A failure after authentication revokes the fresh token before
//! returning, so no half-signed-in state survives.

use secrecy::{ExposeSecret, SecretString};
use stockroom_core::{AccessToken, Backend, Email, SessionSlot, UserSession};
use tracing::instrument;

/// Why a sign-in attempt was refused. `Display` is the user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInError {
    /// Malformed email, empty password, or the auth service refused.
    InvalidCredentials,
    /// The `persons` row is missing, malformed or could not be fetched.
    ProfileUnavailable,
    /// The session slot could not be written.
    Session,
}

impl SignInError {
    /// Message shown on the sign-in page.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Login gagal: Periksa kembali email atau password Anda.",
            Self::ProfileUnavailable => "Gagal mengambil data profile pengguna.",
            Self::Session => "Gagal menyimpan sesi pengguna.",
        }
    }
}

impl std::fmt::Display for SignInError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for SignInError {}

/// Authenticate, load the profile and persist the session.
///
/// # Errors
///
/// Returns a [`SignInError`]; nothing is written to `slot` in that case.
#[instrument(skip(backend, slot, password))]
pub async fn sign_in<B, S>(
    backend: &B,
    slot: &S,
    email: &str,
    password: &SecretString,
) -> Result<UserSession, SignInError>
where
    B: Backend,
    S: SessionSlot,
{
    let email = Email::parse(email).map_err(|e| {
        tracing::info!(error = %e, "Rejected malformed email");
        SignInError::InvalidCredentials
    })?;
    if password.expose_secret().is_empty() {
        return Err(SignInError::InvalidCredentials);
    }

    let principal = backend.sign_in(&email, password).await.map_err(|e| {
        tracing::warn!(error = %e, "Login failed");
        SignInError::InvalidCredentials
    })?;

    let profile = match backend
        .fetch_profile(&principal.access_token, principal.id)
        .await
    {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!(user_id = %principal.id, "No profile row for principal");
            revoke(backend, &principal.access_token).await;
            return Err(SignInError::ProfileUnavailable);
        }
        Err(e) => {
            tracing::error!(user_id = %principal.id, error = %e, "Failed to fetch profile");
            revoke(backend, &principal.access_token).await;
            return Err(SignInError::ProfileUnavailable);
        }
    };

    let access_token = principal.access_token.clone();
    let user = UserSession::new(profile, principal.email.unwrap_or(email), access_token);

    if let Err(e) = slot.set(&user).await {
        tracing::error!(user_id = %user.user_id, error = %e, "Failed to persist session");
        revoke(backend, &principal.access_token).await;
        return Err(SignInError::Session);
    }

    tracing::info!(user_id = %user.user_id, role = %user.role, "User signed in");
    Ok(user)
}

/// Revoke the signed-in user's token and empty the slot.
///
/// A revocation failure is logged and ignored; the slot is cleared anyway.
///
/// # Errors
///
/// Returns the slot's error if it cannot be cleared.
#[instrument(skip_all)]
pub async fn sign_out<B, S>(backend: &B, slot: &S) -> Result<(), S::Error>
where
    B: Backend,
    S: SessionSlot,
{
    let current = slot.get().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read session during sign-out");
        None
    });

    if let Some(user) = current {
        revoke(backend, &user.access_token).await;
        tracing::info!(user_id = %user.user_id, "User signed out");
    }

    slot.clear().await
}

/// Best-effort token revocation.
async fn revoke<B: Backend>(backend: &B, token: &AccessToken) {
    if let Err(e) = backend.sign_out(token).await {
        tracing::warn!(error = %e, "Failed to revoke access token");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_user_message() {
        for err in [
            SignInError::InvalidCredentials,
            SignInError::ProfileUnavailable,
            SignInError::Session,
        ] {
            assert_eq!(err.to_string(), err.user_message());
        }
    }

    #[test]
    fn test_messages_are_the_page_text() {
        assert_eq!(
            SignInError::InvalidCredentials.to_string(),
            "Login gagal: Periksa kembali email atau password Anda."
        );
        assert_eq!(
            SignInError::ProfileUnavailable.to_string(),
            "Gagal mengambil data profile pengguna."
        );
        assert_eq!(
            SignInError::Session.to_string(),
            "Gagal menyimpan sesi pengguna."
        );
    }
}
