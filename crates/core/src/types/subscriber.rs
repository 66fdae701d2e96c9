//! Drop notification subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::SubscriberId;

/// An email address signed up for drop announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
}
