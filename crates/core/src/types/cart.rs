//! Cart entities as exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::price::Price;
use super::product::Product;
use super::session::SessionToken;

const fn default_quantity() -> u32 {
    1
}

/// One (product, size, quantity) entry in a session's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    /// Session token that owns the cart.
    pub user_id: SessionToken,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// A cart line together with the product it refers to.
///
/// The backend resolves the product on every cart read, so price changes
/// apply to lines that are already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub cart_item: CartLine,
    pub product: Product,
}

impl CartEntry {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.cart_item.quantity
    }
}

/// Request to add a line to a cart.
///
/// The backend merges it into an existing line with the same product and
/// size by adding the quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCartLine {
    pub user_id: SessionToken,
    pub product_id: ProductId,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl AddCartLine {
    /// A single unit of `product_id` in `size`.
    #[must_use]
    pub fn single(user_id: SessionToken, product_id: ProductId, size: impl Into<String>) -> Self {
        Self {
            user_id,
            product_id,
            size: size.into(),
            quantity: default_quantity(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_cart_entry() {
        let json = r#"{
            "cart_item": {
                "id": "line-1",
                "user_id": "guest_abc123xyz",
                "product_id": "p-1",
                "size": "9",
                "quantity": 2,
                "added_at": "2025-03-01T12:00:00Z"
            },
            "product": {
                "id": "p-1",
                "name": "Court Classic",
                "description": "Low-top leather",
                "price": 60.5,
                "images": ["https://cdn.example.com/a.jpg"],
                "color": "white",
                "sizes": [{"size": "9", "stock": 4}]
            }
        }"#;

        let entry: CartEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.cart_item.quantity, 2);
        assert_eq!(entry.line_total(), Price::from_dollars(121));
    }

    #[test]
    fn test_add_line_quantity_defaults_to_one() {
        let line: AddCartLine = serde_json::from_str(
            r#"{"user_id":"guest_1","product_id":"p-1","size":"10"}"#,
        )
        .unwrap();
        assert_eq!(line.quantity, 1);
        assert_eq!(
            line,
            AddCartLine::single(SessionToken::parse("guest_1").unwrap(), "p-1".into(), "10")
        );
    }
}
