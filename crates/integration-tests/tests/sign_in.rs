//! Sign-in flow, through the router and at the service level.

use axum::http::StatusCode;
use secrecy::SecretString;
use stockroom_core::Role;
use stockroom_integration_tests::{Call, FakeBackend, MemorySlot, TestApp};
use stockroom_web::services::auth::{SignInError, sign_in};

const LOGIN_FAILED: &str = "Login gagal: Periksa kembali email atau password Anda.";
const PROFILE_FAILED: &str = "Gagal mengambil data profile pengguna.";

fn password(p: &str) -> SecretString {
    SecretString::from(p.to_string())
}

#[tokio::test]
async fn test_admin_sign_in_persists_role_and_email() {
    let backend = FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin));
    let slot = MemorySlot::new();

    let user = sign_in(&backend, &slot, "admin@toko.id", &password("rahasia"))
        .await
        .unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.email.as_str(), "admin@toko.id");
    assert_eq!(Some(user.user_id), backend.principal_id("admin@toko.id"));
    assert_eq!(slot.current(), Some(user));
}

#[tokio::test]
async fn test_sign_in_redirects_and_greets_user() {
    let backend = FakeBackend::new().with_account("budi@toko.id", "rahasia", Some(Role::User));
    let mut app = TestApp::new(backend);

    app.sign_in("budi@toko.id", "rahasia")
        .await
        .assert_redirect("/dashboard");

    let page = app.get("/dashboard").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Welcome, <strong>budi</strong>"));
    assert!(page.body.contains("budi@toko.id"));
}

#[tokio::test]
async fn test_wrong_password_shows_error_and_writes_no_session() {
    let backend = FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin));
    let mut app = TestApp::new(backend);

    let page = app.sign_in("admin@toko.id", "salah").await;
    assert_eq!(page.status, StatusCode::UNAUTHORIZED);
    assert!(page.body.contains(LOGIN_FAILED));
    // Typed email is kept
    assert!(page.body.contains(r#"value="admin@toko.id""#));

    app.get("/dashboard").await.assert_redirect("/signin");
    assert_eq!(app.backend.count(|c| matches!(c, Call::FetchProfile(_))), 0);
}

#[tokio::test]
async fn test_unknown_account_fails_without_retry() {
    let backend = FakeBackend::new();
    let slot = MemorySlot::new();

    let err = sign_in(&backend, &slot, "ghost@toko.id", &password("x"))
        .await
        .unwrap_err();

    assert_eq!(err, SignInError::InvalidCredentials);
    assert_eq!(err.user_message(), LOGIN_FAILED);
    assert_eq!(backend.count(|c| matches!(c, Call::SignIn(_))), 1);
    assert_eq!(slot.current(), None);
}

#[tokio::test]
async fn test_malformed_email_or_empty_password_never_calls_backend() {
    let backend = FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin));
    let slot = MemorySlot::new();

    for (email, pw) in [("not-an-email", "rahasia"), ("admin@toko.id", "")] {
        let err = sign_in(&backend, &slot, email, &password(pw)).await.unwrap_err();
        assert_eq!(err, SignInError::InvalidCredentials);
    }

    assert!(backend.calls().is_empty());
    assert_eq!(slot.current(), None);
}

#[tokio::test]
async fn test_missing_profile_signs_out_and_writes_no_session() {
    let backend = FakeBackend::new().with_account("baru@toko.id", "rahasia", None);
    let mut app = TestApp::new(backend);

    let page = app.sign_in("baru@toko.id", "rahasia").await;
    assert!(page.body.contains(PROFILE_FAILED));

    let id = app.backend.principal_id("baru@toko.id").unwrap();
    assert_eq!(
        app.backend.calls(),
        vec![
            Call::SignIn("baru@toko.id".to_string()),
            Call::FetchProfile(id),
            Call::SignOut(format!("token-{id}")),
        ]
    );

    app.get("/dashboard").await.assert_redirect("/signin");
}

#[tokio::test]
async fn test_profile_fetch_error_compensates() {
    let backend = FakeBackend::new()
        .with_account("admin@toko.id", "rahasia", Some(Role::Admin))
        .failing_profiles();
    let slot = MemorySlot::new();

    let err = sign_in(&backend, &slot, "admin@toko.id", &password("rahasia"))
        .await
        .unwrap_err();

    assert_eq!(err, SignInError::ProfileUnavailable);
    assert_eq!(backend.count(|c| matches!(c, Call::SignOut(_))), 1);
    assert_eq!(slot.current(), None);
}

#[tokio::test]
async fn test_session_write_failure_compensates() {
    let backend = FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin));
    let slot = MemorySlot::failing();

    let err = sign_in(&backend, &slot, "admin@toko.id", &password("rahasia"))
        .await
        .unwrap_err();

    assert_eq!(err, SignInError::Session);
    assert_eq!(err.user_message(), "Gagal menyimpan sesi pengguna.");
    assert_eq!(backend.count(|c| matches!(c, Call::SignOut(_))), 1);
}

#[tokio::test]
async fn test_principal_without_email_falls_back_to_submitted() {
    let backend =
        FakeBackend::new().with_account_without_email("kasir@toko.id", "rahasia", Role::User);
    let slot = MemorySlot::new();

    let user = sign_in(&backend, &slot, "kasir@toko.id", &password("rahasia"))
        .await
        .unwrap();

    assert_eq!(user.email.as_str(), "kasir@toko.id");
    assert_eq!(user.role, Role::User);
    assert!(!user.is_admin());
}
