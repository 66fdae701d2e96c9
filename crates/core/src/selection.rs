//! Add-to-cart interaction state for a single product.
//!
//! ```text
//! NoSizeSelected -> SizeSelected -> Submitting -> Added
//!                        ^               |           |
//!                        +--- failed ----+           |
//!                        +---- ADDED_DISPLAY elapsed-+
//! ```
//!
//! Selecting a sold-out or unknown size never changes the state. Callers
//! supply `Instant`s so the transient "added" window is testable.

use std::time::{Duration, Instant};

use crate::types::Product;

/// How long the "added to cart" confirmation stays up.
pub const ADDED_DISPLAY: Duration = Duration::from_secs(2);

/// Errors returned when a submission cannot start.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// No size has been picked yet.
    #[error("please select a size")]
    NoSizeSelected,
    /// A submission is in flight or was just confirmed.
    #[error("an add to cart is already in progress")]
    Busy,
}

/// Where the add-to-cart interaction currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddToCartState {
    NoSizeSelected,
    SizeSelected(String),
    Submitting(String),
    Added { size: String, until: Instant },
}

/// Selection state for one product detail view.
#[derive(Debug, Clone)]
pub struct ProductSelection {
    state: AddToCartState,
    image_index: usize,
    image_count: usize,
}

impl ProductSelection {
    /// Fresh selection for `product`: no size, first image.
    #[must_use]
    pub fn new(product: &Product) -> Self {
        Self {
            state: AddToCartState::NoSizeSelected,
            image_index: 0,
            image_count: product.images.len(),
        }
    }

    /// Current add-to-cart state.
    #[must_use]
    pub const fn state(&self) -> &AddToCartState {
        &self.state
    }

    /// The selected size label, if any.
    #[must_use]
    pub fn selected_size(&self) -> Option<&str> {
        match &self.state {
            AddToCartState::NoSizeSelected => None,
            AddToCartState::SizeSelected(size)
            | AddToCartState::Submitting(size)
            | AddToCartState::Added { size, .. } => Some(size),
        }
    }

    /// Select `label`. Returns whether the selection changed state.
    ///
    /// Unknown or out-of-stock sizes are ignored, as is any selection while
    /// a submission is in flight.
    pub fn select_size(&mut self, product: &Product, label: &str) -> bool {
        if !product.size(label).is_some_and(|s| s.is_available()) {
            return false;
        }
        if matches!(self.state, AddToCartState::Submitting(_)) {
            return false;
        }
        if let AddToCartState::Added { size, .. } = &mut self.state {
            label.clone_into(size);
        } else {
            self.state = AddToCartState::SizeSelected(label.to_string());
        }
        true
    }

    /// Start submitting. Returns the size to send to the backend.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoSizeSelected`] before a size is picked, and
    /// [`SelectionError::Busy`] while submitting or showing confirmation.
    pub fn begin_submit(&mut self) -> Result<String, SelectionError> {
        match &self.state {
            AddToCartState::NoSizeSelected => Err(SelectionError::NoSizeSelected),
            AddToCartState::Submitting(_) | AddToCartState::Added { .. } => {
                Err(SelectionError::Busy)
            }
            AddToCartState::SizeSelected(size) => {
                let size = size.clone();
                self.state = AddToCartState::Submitting(size.clone());
                Ok(size)
            }
        }
    }

    /// The backend accepted the line; show confirmation until `now + ADDED_DISPLAY`.
    pub fn submit_succeeded(&mut self, now: Instant) {
        if let AddToCartState::Submitting(size) = &self.state {
            self.state = AddToCartState::Added {
                size: size.clone(),
                until: now + ADDED_DISPLAY,
            };
        }
    }

    /// The backend call failed; keep the size so the visitor can retry.
    pub fn submit_failed(&mut self) {
        if let AddToCartState::Submitting(size) = &self.state {
            self.state = AddToCartState::SizeSelected(size.clone());
        }
    }

    /// Advance time; the confirmation reverts once its window has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let AddToCartState::Added { size, until } = &self.state
            && now >= *until
        {
            self.state = AddToCartState::SizeSelected(size.clone());
        }
    }

    /// Index of the image shown large.
    #[must_use]
    pub const fn image_index(&self) -> usize {
        self.image_index
    }

    /// Show image `index`. Out-of-range indices are ignored.
    pub const fn select_image(&mut self, index: usize) -> bool {
        if index < self.image_count {
            self.image_index = index;
            true
        } else {
            false
        }
    }

    /// URL of the selected image.
    #[must_use]
    pub fn selected_image<'p>(&self, product: &'p Product) -> Option<&'p str> {
        product.images.get(self.image_index).map(String::as_str)
    }
}
