//! CLI subcommand implementations.
//!
//! Output goes through `tracing` at info level, one line per record.

pub mod cart;
pub mod drops;
pub mod products;

use kicks_core::{ProductFormError, SelectionError, SessionTokenError};
use thiserror::Error;

/// Errors raised by the CLI itself, before or after a backend call.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The product form did not validate.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductFormError),

    /// An update with no fields set.
    #[error("Nothing to update: pass at least one field")]
    EmptyUpdate,

    /// The session token is malformed.
    #[error("Invalid session token: {0}")]
    InvalidSession(#[from] SessionTokenError),

    /// The size does not exist or is sold out.
    #[error("Size {size} is not available for {product}")]
    SizeUnavailable { product: String, size: String },

    /// The add-to-cart interaction rejected the submission.
    #[error("Cannot add to cart: {0}")]
    Selection(#[from] SelectionError),

    /// The cart line does not belong to this session.
    #[error("Cart line {0} is not in this cart")]
    LineNotInCart(String),

    /// The email address is invalid.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] kicks_core::EmailError),
}
