//! Product modal state machine.
//!
//! The dashboard reuses one modal form for creating and editing products.
//! [`ModalState`] makes the mode explicit so an open modal can never carry a
//! stale edit target:
//!
//! ```text
//!            open_create()                 open_edit(p)
//!  Closed ─────────────────► CreatingNew   Closed ─────────► Editing(p.id)
//!    ▲                            │           ▲                   │
//!    └──── close() / success ─────┘           └─ close()/success ─┘
//! ```
//!
//! Closing always clears the three fields, whichever way the modal was opened.

use serde::Deserialize;

use crate::types::{Price, PriceError, Product, ProductId, ProductInput};

/// Which mode the product modal is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    /// No modal shown.
    #[default]
    Closed,
    /// Adding a new product.
    CreatingNew,
    /// Editing the product with this id.
    Editing(ProductId),
}

/// Raw field values exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductForm {
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Unit price, parsed as a decimal on submit.
    #[serde(default)]
    pub unit_price: String,
    /// Quantity, parsed as an integer on submit.
    #[serde(default)]
    pub quantity: String,
}

/// Why a submission was rejected before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The price is not a non-negative number.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
    /// The quantity is not an integer.
    #[error("Quantity must be a whole number")]
    QuantityNotANumber,
    /// The quantity is below zero.
    #[error("Quantity cannot be negative")]
    NegativeQuantity,
    /// Submit was attempted with the modal closed.
    #[error("The product form is not open")]
    NotOpen,
}

impl ProductForm {
    /// Fields pre-filled from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            unit_price: product.unit_price.to_string(),
            quantity: product.quantity.to_string(),
        }
    }

    /// Validate the three fields into the write shape.
    ///
    /// # Errors
    ///
    /// Returns a [`FormError`] for the first blank or malformed field.
    pub fn parse(&self) -> Result<ProductInput, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingField("Product name"));
        }
        if self.unit_price.trim().is_empty() {
            return Err(FormError::MissingField("Price"));
        }
        let quantity = self.quantity.trim();
        if quantity.is_empty() {
            return Err(FormError::MissingField("Quantity"));
        }

        let unit_price = Price::parse(&self.unit_price)?;
        let quantity: i64 = quantity
            .parse()
            .map_err(|_| FormError::QuantityNotANumber)?;
        if quantity < 0 {
            return Err(FormError::NegativeQuantity);
        }

        Ok(ProductInput {
            name: name.to_owned(),
            unit_price,
            quantity,
        })
    }
}

/// The backend call a valid submission turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Create a new row.
    Insert(ProductInput),
    /// Overwrite the row with this id.
    Update(ProductId, ProductInput),
}

/// Modal state plus its form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductEditor {
    modal: ModalState,
    form: ProductForm,
}

impl ProductEditor {
    /// A closed editor with empty fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an editor from a posted form.
    ///
    /// A closed state always carries empty fields.
    #[must_use]
    pub fn restore(modal: ModalState, form: ProductForm) -> Self {
        match modal {
            ModalState::Closed => Self::new(),
            _ => Self { modal, form },
        }
    }

    /// Open the modal for a new product with empty fields.
    pub fn open_create(&mut self) {
        self.form = ProductForm::default();
        self.modal = ModalState::CreatingNew;
    }

    /// Open the modal pre-filled from `product`.
    pub fn open_edit(&mut self, product: &Product) {
        self.form = ProductForm::from_product(product);
        self.modal = ModalState::Editing(product.id);
    }

    /// Close the modal, dropping the edit target and any unsaved input.
    pub fn close(&mut self) {
        self.form = ProductForm::default();
        self.modal = ModalState::Closed;
    }

    /// Current mode.
    #[must_use]
    pub const fn modal(&self) -> ModalState {
        self.modal
    }

    /// Current field values.
    #[must_use]
    pub const fn form(&self) -> &ProductForm {
        &self.form
    }

    /// Whether the modal is shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.modal != ModalState::Closed
    }

    /// Validate the fields and decide between insert and update.
    ///
    /// The editor is left untouched; call [`close`](Self::close) once the
    /// backend accepts the change.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NotOpen`] when closed, or the field error.
    pub fn submission(&self) -> Result<Submission, FormError> {
        match self.modal {
            ModalState::Closed => Err(FormError::NotOpen),
            ModalState::CreatingNew => Ok(Submission::Insert(self.form.parse()?)),
            ModalState::Editing(id) => Ok(Submission::Update(id, self.form.parse()?)),
        }
    }
}
