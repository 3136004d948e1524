//! Dashboard rendering: list order, empty state, role gating and overlays.

use axum::http::StatusCode;
use stockroom_core::Role;
use stockroom_integration_tests::{Call, FakeBackend, TestApp};

const EMPTY_STATE: &str = "No products found. Please add a new product.";
const CONFIRM_DELETE: &str = "Apakah Anda yakin ingin menghapus produk ini?";

fn admin() -> FakeBackend {
    FakeBackend::new().with_account("admin@toko.id", "rahasia", Some(Role::Admin))
}

fn staff() -> FakeBackend {
    FakeBackend::new().with_account("kasir@toko.id", "rahasia", Some(Role::User))
}

#[tokio::test]
async fn test_products_listed_newest_first() {
    let backend = admin()
        .with_product("Gula Pasir", "14500", 40)
        .with_product("Minyak Goreng", "17000", 12);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard").await;
    assert_eq!(page.status, StatusCode::OK);

    let newest = page.body.find("Minyak Goreng").unwrap();
    let oldest = page.body.find("Gula Pasir").unwrap();
    assert!(newest < oldest);
    assert!(page.body.contains("Rp 14.500"));
    assert!(!page.body.contains(EMPTY_STATE));
    assert_eq!(app.backend.calls(), vec![Call::ListProducts]);
}

#[tokio::test]
async fn test_empty_list_shows_empty_state() {
    let mut app = TestApp::signed_in(admin(), "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard").await;
    assert!(page.body.contains(EMPTY_STATE));
}

#[tokio::test]
async fn test_failed_list_renders_empty_state() {
    let backend = admin().with_product("Gula Pasir", "14500", 40).failing_list();
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(EMPTY_STATE));
}

#[tokio::test]
async fn test_admin_sees_mutation_controls() {
    let backend = admin().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard").await;
    assert!(page.body.contains("Available Products (1)"));
    assert!(page.body.contains("Add Product"));
    assert!(page.body.contains(r#"href="/dashboard?edit=1""#));
    assert!(page.body.contains(r#"href="/dashboard?delete=1""#));
}

#[tokio::test]
async fn test_user_role_sees_no_mutation_controls() {
    let backend = staff().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "kasir@toko.id", "rahasia").await;

    let page = app.get("/dashboard").await;
    assert!(page.body.contains("Gula Pasir"));
    assert!(!page.body.contains("Add Product"));
    assert!(!page.body.contains("?edit="));
    assert!(!page.body.contains("?delete="));

    // Overlay links are ignored for this role
    let page = app.get("/dashboard?modal=new").await;
    assert!(!page.body.contains(r#"name="mode""#));
}

#[tokio::test]
async fn test_add_modal_opens_empty() {
    let mut app = TestApp::signed_in(admin(), "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard?modal=new").await;
    assert!(page.body.contains("Add New Product"));
    assert!(page.body.contains(">Save Product</button>"));
    assert!(page.body.contains(r#"name="mode" value="new""#));
    assert!(page.body.contains(r#"name="name" type="text" value="""#));
}

#[tokio::test]
async fn test_edit_modal_prefills_fields() {
    let backend = admin().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard?edit=1").await;
    assert!(page.body.contains("Edit Product"));
    assert!(page.body.contains(">Update Product</button>"));
    assert!(page.body.contains(r#"name="mode" value="edit""#));
    assert!(page.body.contains(r#"name="product_id" value="1""#));
    assert!(page.body.contains(r#"value="Gula Pasir""#));
    assert!(page.body.contains(r#"value="14500""#));
    assert!(page.body.contains(r#"value="40""#));
}

#[tokio::test]
async fn test_edit_unknown_product_keeps_modal_closed() {
    let backend = admin().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard?edit=999").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(!page.body.contains(r#"name="mode""#));
}

#[tokio::test]
async fn test_delete_link_opens_confirmation() {
    let backend = admin().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    let page = app.get("/dashboard?delete=1").await;
    assert!(page.body.contains(CONFIRM_DELETE));
    assert!(page.body.contains(r#"action="/dashboard/products/1/delete""#));
    assert_eq!(app.backend.count(|c| matches!(c, Call::Delete(_))), 0);
}

#[tokio::test]
async fn test_closing_returns_to_plain_dashboard() {
    let backend = admin().with_product("Gula Pasir", "14500", 40);
    let mut app = TestApp::signed_in(backend, "admin@toko.id", "rahasia").await;

    for overlay in ["/dashboard?modal=new", "/dashboard?edit=1"] {
        let page = app.get(overlay).await;
        assert!(page.body.contains(r#"name="mode""#));
        assert!(page.body.contains(r#"<a class="backdrop" href="/dashboard""#));
        assert!(page.body.contains(r#"<a class="close" href="/dashboard""#));
        assert!(page.body.contains(r#"<a class="button secondary" href="/dashboard">Cancel</a>"#));
        assert_eq!(page.body.matches(r#"href="/dashboard""#).count(), 3);

        let page = app.get("/dashboard").await;
        assert!(!page.body.contains(r#"name="mode""#));
        assert!(!page.body.contains(CONFIRM_DELETE));
    }
}
