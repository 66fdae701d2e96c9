//! Drop announcement commands.

use kicks_core::Email;
use kicks_storefront::backend::BackendClient;
use tracing::info;

use super::CommandError;

/// Subscribe an email address.
///
/// # Errors
///
/// Returns an error if the address is invalid or the backend rejects it.
pub async fn subscribe(client: &BackendClient, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(CommandError::from)?;
    let subscriber = client.subscribe(&email).await?;

    info!(
        id = %subscriber.id,
        "{} subscribed since {}",
        subscriber.email,
        subscriber.subscribed_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

/// List subscribers, newest first.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn list(client: &BackendClient) -> Result<(), Box<dyn std::error::Error>> {
    let subscribers = client.list_subscribers().await?;

    for subscriber in &subscribers {
        info!(
            "{}  {}",
            subscriber.subscribed_at.format("%Y-%m-%d %H:%M"),
            subscriber.email
        );
    }
    info!("{} subscribers", subscribers.len());
    Ok(())
}
