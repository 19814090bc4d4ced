//! Product records as exchanged with the catalog service.
//!
//! Field names on the wire follow the service (`nome`, `preco`, `estoque`);
//! the Rust side uses English names.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as returned by the catalog service.
///
/// Every field is server-owned. The client never constructs a `Product`
/// except by decoding a service response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Service-assigned identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Unit price, normalized from text or number.
    #[serde(rename = "preco")]
    pub price: Price,
    /// Units in stock.
    #[serde(rename = "estoque")]
    pub stock_quantity: u32,
    /// Creation timestamp (opaque, display-only).
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp (opaque, display-only).
    #[serde(default)]
    pub updated_at: String,
}

/// A validated create/update payload.
///
/// Only obtainable through [`Draft::validate`](super::Draft::validate), so
/// every payload that reaches the network has passed client-side checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    #[serde(rename = "nome")]
    pub(crate) name: String,
    #[serde(rename = "preco", serialize_with = "Price::serialize_as_number")]
    pub(crate) price: Price,
    #[serde(rename = "estoque")]
    pub(crate) stock_quantity: u32,
}

impl ProductInput {
    /// Trimmed product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Parsed stock quantity.
    #[must_use]
    pub const fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_service_product_with_text_price() {
        let body = json!({
            "id": 3,
            "nome": "Arroz",
            "preco": "12.30",
            "estoque": 40,
            "created_at": "2025-01-02T10:00:00Z",
            "updated_at": "2025-01-03T09:30:00Z"
        });

        let product: Product = serde_json::from_value(body).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.name, "Arroz");
        assert_eq!(product.price.to_string(), "12.30");
        assert_eq!(product.stock_quantity, 40);
        assert_eq!(product.created_at, "2025-01-02T10:00:00Z");
    }

    #[test]
    fn test_decode_rejects_negative_stock() {
        let body = json!({"id": 1, "nome": "X", "preco": 1, "estoque": -2});
        assert!(serde_json::from_value::<Product>(body).is_err());
    }

    #[test]
    fn test_input_serializes_price_as_number() {
        let input = ProductInput {
            name: "Rice".to_string(),
            price: Price::parse("5.50").unwrap(),
            stock_quantity: 10,
        };

        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, json!({"nome": "Rice", "preco": 5.5, "estoque": 10}));
    }
}
