//! Cart pricing.
//!
//! Shipping is a flat fee below the free-shipping threshold and free at or
//! above it. An empty cart has nothing to ship and is charged nothing.
//! Totals are computed from the product data resolved with the cart, so a
//! product price change re-prices lines already in the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartEntry, Price};

/// Subtotal at which shipping becomes free, in dollars.
pub const FREE_SHIPPING_THRESHOLD: u32 = 200;

/// Shipping fee for carts below the threshold, in dollars.
pub const FLAT_SHIPPING_FEE: u32 = 15;

/// Shipping rules applied when pricing a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: Price,
    pub flat_fee: Price,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Price::from_dollars(FREE_SHIPPING_THRESHOLD),
            flat_fee: Price::from_dollars(FLAT_SHIPPING_FEE),
        }
    }
}

impl ShippingPolicy {
    /// Shipping fee for a cart with the given subtotal and line count.
    #[must_use]
    pub fn shipping_fee(&self, subtotal: Price, line_count: usize) -> Price {
        if line_count == 0 || subtotal >= self.free_shipping_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        }
    }

    /// Price a cart under this policy.
    #[must_use]
    pub fn price(&self, lines: &[CartEntry]) -> CartTotals {
        let subtotal: Price = lines.iter().map(CartEntry::line_total).sum();
        let shipping_fee = self.shipping_fee(subtotal, lines.len());
        let item_count = lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.cart_item.quantity));

        let remaining = self.free_shipping_threshold.amount() - subtotal.amount();
        let free_shipping_remaining = if lines.is_empty() || remaining <= Decimal::ZERO {
            None
        } else {
            Price::new(remaining).ok()
        };

        CartTotals {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            item_count,
            free_shipping_remaining,
        }
    }
}

/// Computed cart amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub total: Price,
    /// Sum of line quantities.
    pub item_count: u32,
    /// How much more the visitor must spend to ship for free, if anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_shipping_remaining: Option<Price>,
}

impl CartTotals {
    /// Whether shipping is free for this cart.
    #[must_use]
    pub const fn ships_free(&self) -> bool {
        self.shipping_fee.amount().is_zero()
    }
}

/// Price a cart with the default shipping policy.
#[must_use]
pub fn price_cart(lines: &[CartEntry]) -> CartTotals {
    ShippingPolicy::default().price(lines)
}
