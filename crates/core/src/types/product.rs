//! Product records as stored in the `products` table.
//!
//! Column names follow the backend schema (`nama_produk`, `harga_satuan`,
//! `quantity`); the Rust field names are English. Other columns, such as
//! `created_at`, are ignored: the backend orders the list itself.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product row read from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Primary key.
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "nama_produk")]
    pub name: String,
    /// Price of a single unit.
    #[serde(rename = "harga_satuan")]
    pub unit_price: Price,
    /// Units in stock.
    pub quantity: i64,
}

impl Product {
    /// The write shape carrying this product's current values.
    #[must_use]
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
        }
    }
}

/// Values sent on insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Display name.
    #[serde(rename = "nama_produk")]
    pub name: String,
    /// Price of a single unit.
    #[serde(rename = "harga_satuan")]
    pub unit_price: Price,
    /// Units in stock.
    pub quantity: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_input_uses_backend_column_names() {
        let input = ProductInput {
            name: "Widget".to_string(),
            unit_price: Price::parse("10.5").unwrap(),
            quantity: 3,
        };

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "nama_produk": "Widget", "harga_satuan": 10.5, "quantity": 3 })
        );
    }

    #[test]
    fn test_product_from_backend_row() {
        let row = json!({
            "id": 7,
            "nama_produk": "Kopi Bubuk",
            "harga_satuan": 15000,
            "quantity": 12,
            "created_at": "2024-05-01T08:30:00.123456+00:00"
        });

        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.name, "Kopi Bubuk");
        assert_eq!(product.unit_price.to_rupiah(), "Rp 15.000");
        assert_eq!(product.quantity, 12);
    }

    #[test]
    fn test_product_row_with_naive_timestamp() {
        // `timestamp without time zone` columns come back with no offset
        let row = json!({
            "id": 1,
            "nama_produk": "Teh",
            "harga_satuan": 3500,
            "quantity": 2,
            "created_at": "2024-05-01T08:30:00.123456"
        });
        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.name, "Teh");
        assert_eq!(product.quantity, 2);
    }

    #[test]
    fn test_product_list_survives_mixed_timestamps() {
        let rows = json!([
            { "id": 2, "nama_produk": "Kopi", "harga_satuan": 20000, "quantity": 1, "created_at": "2024-05-02T09:00:00" },
            { "id": 1, "nama_produk": "Teh", "harga_satuan": 3500.5, "quantity": 0, "created_at": "2024-05-01T08:30:00+07:00" },
            { "id": 3, "nama_produk": "Gula", "harga_satuan": 14500, "quantity": 5 }
        ]);
        let products: Vec<Product> = serde_json::from_value(rows).unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[1].to_input().quantity, 0);
    }
}
