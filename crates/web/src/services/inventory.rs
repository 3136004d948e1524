//! Product list and mutations.
//!
//! Backend failures never reach the user as errors: they are logged and the
//! caller re-renders with what it has.

use stockroom_core::{
    AccessToken, Backend, FormError, Product, ProductEditor, ProductId, Submission,
};
use tracing::instrument;

/// Result of submitting the product modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The backend accepted the change; the editor is now closed.
    Saved,
    /// Rejected before any backend call.
    Invalid(FormError),
    /// The backend call failed; the editor keeps its fields.
    Failed,
}

/// The user's answer to the delete confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Proceed with the delete.
    Confirmed,
    /// Dismissed or never answered.
    Declined,
}

impl Confirmation {
    /// Only an explicit `yes` confirms.
    #[must_use]
    pub fn from_answer(answer: Option<&str>) -> Self {
        match answer.map(str::trim) {
            Some(a) if a.eq_ignore_ascii_case("yes") => Self::Confirmed,
            _ => Self::Declined,
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Not confirmed; no backend call was made.
    Declined,
    /// Row deleted.
    Deleted,
    /// The backend call failed.
    Failed,
}

/// Fetch all products, newest first.
///
/// A failed fetch is logged and yields an empty list.
#[instrument(skip_all)]
pub async fn load_products<B: Backend>(backend: &B, token: &AccessToken) -> Vec<Product> {
    match backend.list_products(token).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            Vec::new()
        }
    }
}

/// Validate the editor's fields and issue exactly one insert or update.
///
/// Closes `editor` on success.
#[instrument(skip_all, fields(modal = ?editor.modal()))]
pub async fn save_product<B: Backend>(
    backend: &B,
    token: &AccessToken,
    editor: &mut ProductEditor,
) -> SaveOutcome {
    let submission = match editor.submission() {
        Ok(submission) => submission,
        Err(e) => {
            tracing::debug!(error = %e, "Product form rejected");
            return SaveOutcome::Invalid(e);
        }
    };

    let result = match &submission {
        Submission::Insert(input) => backend.insert_product(token, input).await,
        Submission::Update(id, input) => backend.update_product(token, *id, input).await,
    };

    match result {
        Ok(()) => {
            match submission {
                Submission::Insert(input) => tracing::info!(name = %input.name, "Product added"),
                Submission::Update(id, _) => tracing::info!(product_id = %id, "Product updated"),
            }
            editor.close();
            SaveOutcome::Saved
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save product");
            SaveOutcome::Failed
        }
    }
}

/// Delete `id` if the user confirmed.
#[instrument(skip(backend, token))]
pub async fn delete_product<B: Backend>(
    backend: &B,
    token: &AccessToken,
    id: ProductId,
    confirmation: Confirmation,
) -> DeleteOutcome {
    if confirmation == Confirmation::Declined {
        return DeleteOutcome::Declined;
    }

    match backend.delete_product(token, id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            DeleteOutcome::Deleted
        }
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "Failed to delete product");
            DeleteOutcome::Failed
        }
    }
}
