//! Drop announcement subscription handlers.
//!
//! Subscribing is idempotent: an address that is already on the list gets
//! the same confirmation as a new one.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use kicks_core::{Email, Subscriber};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Subscription request body.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscription confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribedView {
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
    pub message: &'static str,
}

impl From<Subscriber> for SubscribedView {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            email: subscriber.email,
            subscribed_at: subscriber.subscribed_at,
            message: "You're on the list for the next drop",
        }
    }
}

/// Subscribe an email to drop announcements.
#[instrument(skip(state, request))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribedView>> {
    let email = Email::parse(&request.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let subscriber = state
        .backend()
        .subscribe(&email)
        .await
        .map_err(AppError::action("Failed to subscribe"))?;

    tracing::info!(domain = %email.domain(), "Drop subscription successful");
    Ok(Json(SubscribedView::from(subscriber)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kicks_core::SubscriberId;

    use super::*;

    #[test]
    fn test_subscribed_view() {
        let subscriber = Subscriber {
            id: SubscriberId::new("s-1"),
            email: Email::parse("drops@example.com").unwrap(),
            subscribed_at: Utc::now(),
        };
        let view = SubscribedView::from(subscriber);
        assert_eq!(view.email.as_str(), "drops@example.com");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["email"], "drops@example.com");
    }
}
