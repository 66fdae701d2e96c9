//! Session middleware configuration and guest identity.
//!
//! Sets up in-memory sessions using tower-sessions. The only thing kept in
//! a session is the visitor's guest token, which scopes their cart on the
//! backend.

use kicks_core::SessionToken;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "kicks_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Session keys.
pub mod keys {
    /// Key for the visitor's guest cart token.
    pub const GUEST_TOKEN: &str = "guest_token";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Get the guest token from the session, if one was issued.
///
/// A value that no longer parses is treated as absent.
pub async fn get_guest_token(session: &Session) -> Option<SessionToken> {
    session
        .get::<SessionToken>(keys::GUEST_TOKEN)
        .await
        .ok()
        .flatten()
}

/// Get the guest token from the session, issuing a new one if needed.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn get_or_issue_guest_token(
    session: &Session,
) -> Result<SessionToken, tower_sessions::session::Error> {
    if let Some(token) = get_guest_token(session).await {
        return Ok(token);
    }

    let token = SessionToken::generate();
    session.insert(keys::GUEST_TOKEN, &token).await?;
    tracing::debug!("Issued guest token");
    Ok(token)
}
