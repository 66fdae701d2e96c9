//! Catalog filtering.
//!
//! The shop page narrows the product list by color and price range. All set
//! criteria must hold (logical AND); unset criteria do not constrain. The
//! filter never reorders or drops products for any other reason.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Active shop filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Exact color, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Inclusive lower price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
}

impl FilterCriteria {
    /// Build criteria from raw form input.
    ///
    /// Blank color means "any color". Price bounds that are blank or do not
    /// parse are treated as unset rather than rejected.
    #[must_use]
    pub fn from_form(color: &str, min_price: &str, max_price: &str) -> Self {
        let color = color.trim();
        Self {
            color: (!color.is_empty()).then(|| color.to_string()),
            min_price: parse_price_bound(min_price),
            max_price: parse_price_bound(max_price),
        }
    }

    /// Whether no criterion is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.color.is_none() && self.min_price.is_none() && self.max_price.is_none()
    }

    /// Reset every criterion ("clear filters").
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Select `color`, or deselect it if it is already the selected color.
    pub fn toggle_color(&mut self, color: &str) {
        let already_selected = self
            .color
            .as_deref()
            .is_some_and(|selected| colors_match(selected, color));
        self.color = if already_selected {
            None
        } else {
            Some(color.to_string())
        };
    }

    /// Whether `product` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let price = product.price.amount();
        self.color
            .as_deref()
            .is_none_or(|color| colors_match(color, &product.color))
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}

fn colors_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Parse a price bound typed into a form field.
///
/// Returns `None` for blank input or anything that is not a decimal number.
#[must_use]
pub fn parse_price_bound(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Products matching `criteria`, in their original order.
#[must_use]
pub fn filter(products: &[Product], criteria: &FilterCriteria) -> Vec<Product> {
    if criteria.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect()
}

/// Distinct product colors in first-seen order, for the color facet.
#[must_use]
pub fn available_colors(products: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter(|p| seen.insert(p.color.as_str()))
        .map(|p| p.color.clone())
        .collect()
}
