//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Clients only ever see a short notice; backend details stay in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend call behind a visitor action failed.
    #[error("{notice}: {source}")]
    ActionFailed {
        /// Generic notice shown to the visitor, e.g. "Failed to add to cart".
        notice: &'static str,
        #[source]
        source: BackendError,
    },

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The operation exists but is not available.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a backend error behind a visitor-facing notice.
    ///
    /// ```rust,ignore
    /// client.get_cart(&token).await.map_err(AppError::action("Failed to load cart"))?;
    /// ```
    pub fn action(notice: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::ActionFailed { notice, source }
    }

    /// Like [`AppError::action`], but a backend 404 becomes [`AppError::NotFound`].
    pub fn lookup(what: &'static str, notice: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| {
            if source.is_not_found() {
                Self::NotFound(what.to_string())
            } else {
                Self::ActionFailed { notice, source }
            }
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::ActionFailed {
                source: BackendError::RateLimited(_),
                ..
            } => StatusCode::TOO_MANY_REQUESTS,
            Self::ActionFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::ActionFailed { notice, .. } => (*notice).to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(message) | Self::NotImplemented(message) => message.clone(),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::ActionFailed { .. } | Self::Session(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
