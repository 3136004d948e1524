//! Session gate: unauthenticated requests never reach the dashboard.

use axum::http::{StatusCode, header};
use stockroom_core::Role;
use stockroom_integration_tests::{FakeBackend, TestApp};

#[tokio::test]
async fn test_dashboard_without_session_redirects_to_signin() {
    let mut app = TestApp::new(FakeBackend::new().with_product("Widget", "1", 1));

    app.get("/dashboard").await.assert_redirect("/signin");
    assert!(app.backend.calls().is_empty(), "no backend call without a session");
}

#[tokio::test]
async fn test_overlays_without_session_redirect_to_signin() {
    let mut app = TestApp::new(FakeBackend::new());

    app.get("/dashboard?modal=new").await.assert_redirect("/signin");
    app.get("/dashboard?edit=1").await.assert_redirect("/signin");
    app.get("/dashboard?delete=1").await.assert_redirect("/signin");
}

#[tokio::test]
async fn test_mutations_without_session_redirect_to_signin() {
    let mut app = TestApp::new(FakeBackend::new().with_product("Widget", "1", 1));

    app.post_form(
        "/dashboard/products",
        &[("mode", "new"), ("name", "X"), ("unit_price", "1"), ("quantity", "1")],
    )
    .await
    .assert_redirect("/signin");
    app.post_form("/dashboard/products/1/delete", &[("confirm", "yes")])
        .await
        .assert_redirect("/signin");

    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_root_redirects_to_dashboard() {
    let mut app = TestApp::new(FakeBackend::new());
    app.get("/").await.assert_redirect("/dashboard");
}

#[tokio::test]
async fn test_signin_page_renders_for_visitors() {
    let mut app = TestApp::new(FakeBackend::new());

    let page = app.get("/signin").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"action="/signin""#));
}

#[tokio::test]
async fn test_signin_page_skipped_when_signed_in() {
    let backend = FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin));
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    app.get("/signin").await.assert_redirect("/dashboard");
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let mut app = TestApp::new(FakeBackend::new());

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "ok");
    assert_eq!(
        health.headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(health.headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert!(health.headers.contains_key(header::CONTENT_SECURITY_POLICY));

    // No session database attached in tests
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}
