//! Client for the Kicks REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, carts and subscribers
//! - Plain JSON over HTTP via `reqwest`, one round-trip per operation
//! - In-memory caching of product reads via `moka`; carts are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use kicks_storefront::backend::{BackendClient, ProductQuery};
//!
//! let client = BackendClient::new(&config.backend)?;
//! let featured = client.list_products(ProductQuery::featured()).await?;
//! let cart = client.get_cart(&token).await?;
//! ```

mod cache;
mod client;

pub use client::{BackendClient, ProductQuery};

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot have paths appended.
    #[error("Invalid backend base URL: {0}")]
    InvalidBaseUrl(String),
}

impl BackendError {
    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
