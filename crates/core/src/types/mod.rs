//! Core types for Kicks.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the entities exchanged with the backend.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod session;
pub mod subscriber;

pub use cart::{AddCartLine, CartEntry, CartLine};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product, ProductUpdate, Size};
pub use session::{SessionToken, SessionTokenError};
pub use subscriber::Subscriber;
