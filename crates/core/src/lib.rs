//! Kicks Core - domain types and storefront computations.
//!
//! This crate is shared by every Kicks component:
//! - `storefront` - JSON storefront service and REST backend client
//! - `cli` - Command-line tools for catalog administration and shopping
//!
//! # Architecture
//!
//! The core crate contains types and pure functions only - no I/O, no HTTP
//! clients, no clocks it reads on its own. Every entity is an immutable
//! snapshot fetched from the backend; the computations here derive new
//! read-only results from those snapshots.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, session tokens and entities
//! - [`catalog`] - Product filtering by color and price range
//! - [`pricing`] - Cart subtotal, shipping fee and total
//! - [`selection`] - Add-to-cart interaction state for a product
//! - [`forms`] - Parsing of the admin "add product" form

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod forms;
pub mod pricing;
pub mod selection;
pub mod types;

pub use catalog::FilterCriteria;
pub use forms::{ProductForm, ProductFormError};
pub use pricing::{CartTotals, ShippingPolicy, price_cart};
pub use selection::{AddToCartState, ProductSelection, SelectionError};
pub use types::*;
