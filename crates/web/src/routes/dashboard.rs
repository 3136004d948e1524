//! Dashboard: product list, add/edit modal and delete confirmation.
//!
//! The modal is driven by the query string so every state is a plain link:
//! cancel, the close icon and the backdrop all point back at `/dashboard`.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use stockroom_core::{
    Backend, FormError, ModalState, Product, ProductEditor, ProductForm, ProductId, UserSession,
};
use tracing::instrument;

use crate::middleware::{RequireAdmin, RequireSession};
use crate::services::inventory::{self, Confirmation, DeleteOutcome, SaveOutcome};
use crate::state::AppState;

/// Dashboard location; every mutation redirects here.
pub const DASHBOARD_PATH: &str = "/dashboard";

// =============================================================================
// Query / Form Types
// =============================================================================

/// Which overlay to open.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// `new` opens the add modal.
    pub modal: Option<String>,
    /// Product id to edit.
    pub edit: Option<String>,
    /// Product id to confirm deletion of.
    pub delete: Option<String>,
}

/// Product modal submission.
#[derive(Debug, Deserialize)]
pub struct ProductSubmit {
    /// `new` or `edit`.
    #[serde(default)]
    pub mode: String,
    /// Target id when editing.
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default)]
    pub quantity: String,
}

impl ProductSubmit {
    fn modal_state(&self) -> ModalState {
        match self.mode.as_str() {
            "new" => ModalState::CreatingNew,
            "edit" => ProductId::from_str(&self.product_id)
                .map_or(ModalState::Closed, ModalState::Editing),
            _ => ModalState::Closed,
        }
    }

    fn into_editor(self) -> ProductEditor {
        let modal = self.modal_state();
        ProductEditor::restore(
            modal,
            ProductForm {
                name: self.name,
                unit_price: self.unit_price,
                quantity: self.quantity,
            },
        )
    }
}

/// Delete confirmation answer.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub confirm: Option<String>,
}

// =============================================================================
// Views
// =============================================================================

/// A table row.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub quantity: i64,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.unit_price.to_rupiah(),
            quantity: product.quantity,
        }
    }
}

/// The open add/edit modal.
#[derive(Debug, Clone)]
pub struct ModalView {
    pub title: &'static str,
    pub submit_label: &'static str,
    pub mode: &'static str,
    pub product_id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: String,
    pub error: Option<String>,
}

impl ModalView {
    fn from_editor(editor: &ProductEditor, error: Option<&FormError>) -> Option<Self> {
        let (title, submit_label, mode, product_id) = match editor.modal() {
            ModalState::Closed => return None,
            ModalState::CreatingNew => ("Add New Product", "Save Product", "new", String::new()),
            ModalState::Editing(id) => ("Edit Product", "Update Product", "edit", id.to_string()),
        };
        let form = editor.form();

        Some(Self {
            title,
            submit_label,
            mode,
            product_id,
            name: form.name.clone(),
            unit_price: form.unit_price.clone(),
            quantity: form.quantity.clone(),
            error: error.map(ToString::to_string),
        })
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub products: Vec<ProductView>,
    pub modal: Option<ModalView>,
    pub delete_target: Option<ProductView>,
}

impl DashboardTemplate {
    fn new(
        user: &UserSession,
        products: &[Product],
        editor: &ProductEditor,
        error: Option<&FormError>,
        delete_target: Option<&Product>,
    ) -> Self {
        Self {
            user_name: user.display_name().to_string(),
            email: user.email.to_string(),
            role: user.role.to_string(),
            is_admin: user.is_admin(),
            products: products.iter().map(ProductView::from).collect(),
            modal: ModalView::from_editor(editor, error),
            delete_target: delete_target.map(ProductView::from),
        }
    }
}

fn parse_id(raw: Option<&str>) -> Option<ProductId> {
    raw.and_then(|id| ProductId::from_str(id).ok())
}

fn find(products: &[Product], id: ProductId) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

// =============================================================================
// Handlers
// =============================================================================

/// Render the product list, with an overlay when the query asks for one.
///
/// Overlays are admin-only; for other roles the query is ignored.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    RequireSession(user): RequireSession,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let products = inventory::load_products(state.backend(), &user.access_token).await;

    let mut editor = ProductEditor::new();
    let mut delete_target = None;

    if user.is_admin() {
        if query.modal.as_deref() == Some("new") {
            editor.open_create();
        } else if let Some(id) = parse_id(query.edit.as_deref()) {
            // Unknown ids leave the modal closed
            if let Some(product) = find(&products, id) {
                editor.open_edit(product);
            }
        } else if let Some(id) = parse_id(query.delete.as_deref()) {
            delete_target = find(&products, id);
        }
    }

    DashboardTemplate::new(&user, &products, &editor, None, delete_target).into_response()
}

/// Insert or update a product from the modal.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn save<B: Backend>(
    State(state): State<AppState<B>>,
    RequireAdmin(user): RequireAdmin,
    Form(submit): Form<ProductSubmit>,
) -> Response {
    let mut editor = submit.into_editor();
    let outcome = inventory::save_product(state.backend(), &user.access_token, &mut editor).await;

    let (status, error) = match &outcome {
        SaveOutcome::Saved | SaveOutcome::Invalid(FormError::NotOpen) => {
            return Redirect::to(DASHBOARD_PATH).into_response();
        }
        SaveOutcome::Invalid(e) => (StatusCode::UNPROCESSABLE_ENTITY, Some(e)),
        SaveOutcome::Failed => (StatusCode::OK, None),
    };

    // Re-render the modal open with what the user typed
    let products = inventory::load_products(state.backend(), &user.access_token).await;
    let page = DashboardTemplate::new(&user, &products, &editor, error, None);
    (status, page).into_response()
}

/// Delete a product once the confirmation was answered with `yes`.
#[instrument(skip_all, fields(user_id = %user.user_id, product_id = id))]
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let confirmation = Confirmation::from_answer(form.confirm.as_deref());
    let outcome = inventory::delete_product(
        state.backend(),
        &user.access_token,
        ProductId::new(id),
        confirmation,
    )
    .await;

    if outcome == DeleteOutcome::Declined {
        tracing::debug!("Delete not confirmed");
    }

    Redirect::to(DASHBOARD_PATH)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_core::Price;

    use super::*;

    fn submit(mode: &str, product_id: &str) -> ProductSubmit {
        ProductSubmit {
            mode: mode.to_string(),
            product_id: product_id.to_string(),
            name: "Widget".to_string(),
            unit_price: "10.5".to_string(),
            quantity: "3".to_string(),
        }
    }

    #[test]
    fn test_submit_mode_maps_to_modal_state() {
        assert_eq!(submit("new", "").modal_state(), ModalState::CreatingNew);
        assert_eq!(
            submit("edit", "12").modal_state(),
            ModalState::Editing(ProductId::new(12))
        );
        assert_eq!(submit("edit", "abc").modal_state(), ModalState::Closed);
        assert_eq!(submit("", "12").modal_state(), ModalState::Closed);
    }

    #[test]
    fn test_closed_submit_drops_fields() {
        let editor = submit("bogus", "").into_editor();
        assert!(!editor.is_open());
        assert!(editor.form().name.is_empty());
    }

    #[test]
    fn test_product_view_formats_price() {
        let product = Product {
            id: ProductId::new(4),
            name: "Beras".to_string(),
            unit_price: Price::parse("1234567.892").unwrap(),
            quantity: 2,
        };
        let view = ProductView::from(&product);
        assert_eq!(view.id, "4");
        assert_eq!(view.price, "Rp 1.234.567,892");
    }

    #[test]
    fn test_modal_view_titles() {
        let mut editor = ProductEditor::new();
        assert!(ModalView::from_editor(&editor, None).is_none());

        editor.open_create();
        let view = ModalView::from_editor(&editor, None).unwrap();
        assert_eq!(view.title, "Add New Product");
        assert_eq!(view.submit_label, "Save Product");
        assert_eq!(view.mode, "new");

        editor.open_edit(&Product {
            id: ProductId::new(3),
            name: "Teh".to_string(),
            unit_price: Price::parse("3500").unwrap(),
            quantity: 1,
        });
        let view = ModalView::from_editor(&editor, None).unwrap();
        assert_eq!(view.title, "Edit Product");
        assert_eq!(view.submit_label, "Update Product");
        assert_eq!(view.product_id, "3");

        let error = FormError::QuantityNotANumber;
        let view = ModalView::from_editor(&editor, Some(&error)).unwrap();
        assert_eq!(view.error.as_deref(), Some("Quantity must be a whole number"));
    }
}
