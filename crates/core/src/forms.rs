//! Admin "add product" form parsing.
//!
//! The admin panel collects everything as free text: images as a
//! comma-separated URL list and sizes as `size:stock` pairs, e.g.
//! `"8:10, 9:15, 10:20"`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::product::DEFAULT_CATEGORY;
use crate::types::{NewProduct, Price, Size};

/// Stock assumed for a size whose stock part is missing or not a number.
pub const DEFAULT_SIZE_STOCK: u32 = 10;

/// Errors produced while turning a [`ProductForm`] into a [`NewProduct`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductFormError {
    /// A required text field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The price is not a decimal number.
    #[error("invalid price: {0:?}")]
    InvalidPrice(String),
    /// The price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,
    /// No image URL was given.
    #[error("at least one image URL is required")]
    NoImages,
    /// No size was given.
    #[error("at least one size is required")]
    NoSizes,
}

/// Raw admin form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    /// Comma-separated image URLs.
    pub images: String,
    pub color: String,
    /// Comma-separated `size:stock` pairs.
    pub sizes: String,
    #[serde(default)]
    pub featured: bool,
}

impl ProductForm {
    /// Validate the form and build the create payload.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductFormError`] found, checking fields in form
    /// order.
    pub fn into_new_product(self) -> Result<NewProduct, ProductFormError> {
        let name = required(&self.name, "name")?;
        let description = required(&self.description, "description")?;
        let price = parse_price(&self.price)?;
        let color = required(&self.color, "color")?;

        let images = parse_images(&self.images);
        if images.is_empty() {
            return Err(ProductFormError::NoImages);
        }

        let sizes = parse_sizes(&self.sizes);
        if sizes.is_empty() {
            return Err(ProductFormError::NoSizes);
        }

        Ok(NewProduct {
            name,
            description,
            price,
            images,
            category: DEFAULT_CATEGORY.to_string(),
            color,
            sizes,
            featured: self.featured,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ProductFormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProductFormError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Parse a price typed by an admin.
///
/// # Errors
///
/// Fails on blank or non-numeric input and on negative amounts.
pub fn parse_price(raw: &str) -> Result<Price, ProductFormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProductFormError::MissingField("price"));
    }
    let amount =
        Decimal::from_str(raw).map_err(|_| ProductFormError::InvalidPrice(raw.to_string()))?;
    Price::new(amount).map_err(|_| ProductFormError::NegativePrice)
}

/// Split a comma-separated URL list, dropping blanks.
#[must_use]
pub fn parse_images(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `size:stock` pairs.
///
/// A pair without a usable stock gets [`DEFAULT_SIZE_STOCK`]; blank entries
/// are skipped.
#[must_use]
pub fn parse_sizes(raw: &str) -> Vec<Size> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (label, stock) = pair.split_once(':').unwrap_or((pair, ""));
            let label = label.trim();
            if label.is_empty() {
                return None;
            }
            let stock = stock.trim().parse().unwrap_or(DEFAULT_SIZE_STOCK);
            Some(Size::new(label, stock))
        })
        .collect()
}
