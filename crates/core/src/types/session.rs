//! Guest session token.
//!
//! Unauthenticated visitors get an opaque pseudo-identity that scopes their
//! cart on the backend. The token is always passed explicitly: the storefront
//! keeps it in the visitor's session, the CLI takes it as an argument.
//! Anyone holding a token can read and change that cart.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const GUEST_PREFIX: &str = "guest_";
const RANDOM_LEN: usize = 9;

/// Errors that can occur when parsing a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    /// The token is empty.
    #[error("session token cannot be empty")]
    Empty,
    /// The token is too long.
    #[error("session token must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The token contains a character outside `[A-Za-z0-9_-]`.
    #[error("session token contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Opaque token identifying a guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Maximum accepted token length.
    pub const MAX_LENGTH: usize = 128;

    /// Generate a fresh guest token such as `guest_k3x9q0a1z`.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..RANDOM_LEN)
            .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        Self(format!("{GUEST_PREFIX}{suffix}"))
    }

    /// Parse a token received from a caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty, too long, or contains
    /// characters that are not safe in a URL path segment.
    pub fn parse(s: &str) -> Result<Self, SessionTokenError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SessionTokenError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionTokenError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(SessionTokenError::InvalidCharacter(c));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this token was generated for a guest visitor.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionToken {
    type Err = SessionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
