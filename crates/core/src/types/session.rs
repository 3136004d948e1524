//! Profile and session records.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{Email, ProfileId, Role};

/// Bearer token issued by the authentication service.
///
/// Queries are sent with this token so the backend's row-level policies see
/// the signed-in user. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Application-level user record from the `persons` table.
///
/// Columns other than these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the authentication principal.
    pub id: ProfileId,
    /// Display name shown in the dashboard greeting.
    #[serde(default)]
    pub username: Option<String>,
    /// Role gating the mutation controls.
    pub role: Role,
}

/// The signed-in user, persisted in the session slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Profile / principal id.
    pub user_id: ProfileId,
    /// Display name from the profile, if it has one.
    pub username: Option<String>,
    /// Email the user authenticated with.
    pub email: Email,
    /// Role copied from the profile.
    pub role: Role,
    /// Token used for backend queries on the user's behalf.
    pub access_token: AccessToken,
}

impl UserSession {
    /// Merge a profile with the authenticated email and token.
    #[must_use]
    pub fn new(profile: Profile, email: Email, access_token: AccessToken) -> Self {
        Self {
            user_id: profile.id,
            username: profile.username,
            email,
            role: profile.role,
            access_token,
        }
    }

    /// Name for greetings: the profile username, else the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.username.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.local_part(),
        }
    }

    /// Whether the add, edit and delete controls are shown.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.can_manage_products()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn profile(username: Option<&str>, role: Role) -> Profile {
        Profile {
            id: ProfileId::new(Uuid::nil()),
            username: username.map(str::to_owned),
            role,
        }
    }

    #[test]
    fn test_session_merges_profile_and_email() {
        let email = Email::parse("rina@toko.id").unwrap();
        let session = UserSession::new(
            profile(Some("Rina"), Role::Admin),
            email.clone(),
            AccessToken::new("tok".into()),
        );

        assert_eq!(session.email, email);
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.display_name(), "Rina");
        assert!(session.is_admin());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let session = UserSession::new(
            profile(None, Role::User),
            Email::parse("budi@toko.id").unwrap(),
            AccessToken::new("tok".into()),
        );
        assert_eq!(session.display_name(), "budi");
        assert!(!session.is_admin());
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiJ9.secret".into());
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_profile_ignores_extra_columns() {
        let row = serde_json::json!({
            "id": Uuid::nil(),
            "username": "rina",
            "role": "admin",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let parsed: Profile = serde_json::from_value(row).unwrap();
        assert_eq!(parsed.role, Role::Admin);
    }

    #[test]
    fn test_profile_with_unknown_role_is_rejected() {
        let row = serde_json::json!({ "id": Uuid::nil(), "role": "owner" });
        assert!(serde_json::from_value::<Profile>(row).is_err());
    }
}
