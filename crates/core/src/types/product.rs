//! Catalog entities as exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Category assigned to every product created from the admin panel.
pub const DEFAULT_CATEGORY: &str = "sneakers";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Every product has at least one image to show in listings.
fn non_empty_images<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let images = Vec::<String>::deserialize(deserializer)?;
    if images.is_empty() {
        return Err(serde::de::Error::custom("product has no images"));
    }
    Ok(images)
}

/// A size offered for a product with its remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    /// Size label, e.g. "9" or "10.5".
    pub size: String,
    /// Units in stock.
    pub stock: u32,
}

impl Size {
    /// Create a size entry.
    #[must_use]
    pub fn new(size: impl Into<String>, stock: u32) -> Self {
        Self {
            size: size.into(),
            stock,
        }
    }

    /// A size with no stock cannot be selected.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog item offered for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Image URLs in display order; the first is the primary image.
    #[serde(deserialize_with = "non_empty_images")]
    pub images: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    /// Free-text color label ("black", "White", ...).
    pub color: String,
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Look up a size entry by its label.
    #[must_use]
    pub fn size(&self, label: &str) -> Option<&Size> {
        self.sizes.iter().find(|s| s.size == label)
    }

    /// The image shown in listings.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Total units in stock across all sizes.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.sizes.iter().map(|s| u64::from(s.stock)).sum()
    }

    /// Whether at least one size can be selected.
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.sizes.iter().any(Size::is_available)
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    pub color: String,
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial product update. Fields left as `None` are not sent and stay
/// unchanged on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<Size>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl ProductUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.images.is_none()
            && self.category.is_none()
            && self.color.is_none()
            && self.sizes.is_none()
            && self.featured.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BACKEND_PRODUCT: &str = r#"{
        "id": "p-1",
        "name": "Court Classic",
        "description": "Low-top leather",
        "price": 129.99,
        "images": ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"],
        "category": "sneakers",
        "color": "White",
        "sizes": [{"size": "9", "stock": 3}, {"size": "10", "stock": 0}],
        "featured": true,
        "created_at": "2025-03-01T12:00:00Z"
    }"#;

    #[test]
    fn test_deserialize_backend_product() {
        let product: Product = serde_json::from_str(BACKEND_PRODUCT).unwrap();
        assert_eq!(product.id, ProductId::new("p-1"));
        assert_eq!(product.price, Price::from_cents(12_999));
        assert_eq!(product.primary_image(), Some("https://cdn.example.com/a.jpg"));
        assert!(product.featured);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn test_size_availability() {
        let product: Product = serde_json::from_str(BACKEND_PRODUCT).unwrap();
        assert!(product.size("9").unwrap().is_available());
        assert!(!product.size("10").unwrap().is_available());
        assert!(product.size("11").is_none());
        assert_eq!(product.total_stock(), 3);
        assert!(product.is_in_stock());
    }

    #[test]
    fn test_optional_fields_default() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p-2","name":"n","description":"d","price":10,"images":["i"],"color":"red"}"#,
        )
        .unwrap();
        assert_eq!(product.category, DEFAULT_CATEGORY);
        assert!(product.sizes.is_empty());
        assert!(!product.featured);
        assert!(!product.is_in_stock());
    }

    #[test]
    fn test_rejects_product_without_images() {
        let err = serde_json::from_str::<Product>(
            r#"{"id":"p-3","name":"n","description":"d","price":10,"images":[],"color":"red"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("product has no images"));
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ProductUpdate {
            price: Some(Price::from_dollars(99)),
            featured: Some(false),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"price": 99.0, "featured": false}));
        assert!(!update.is_empty());
        assert!(ProductUpdate::default().is_empty());
    }
}
