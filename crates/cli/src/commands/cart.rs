//! Guest cart commands.
//!
//! The CLI has no session storage: every cart command takes the guest
//! token explicitly. `kicks session new` issues one.

use kicks_core::{
    AddCartLine, CartEntry, CartLineId, ProductId, ProductSelection, SessionToken, price_cart,
};
use kicks_storefront::backend::BackendClient;
use tracing::info;

use super::CommandError;

fn parse_session(session: &str) -> Result<SessionToken, CommandError> {
    Ok(SessionToken::parse(session)?)
}

fn log_cart(entries: &[CartEntry]) {
    if entries.is_empty() {
        info!("Cart is empty");
        return;
    }

    for entry in entries {
        info!(
            "{}  {} (size {}) x{}  {}",
            entry.cart_item.id,
            entry.product.name,
            entry.cart_item.size,
            entry.cart_item.quantity,
            entry.line_total()
        );
    }

    let totals = price_cart(entries);
    info!("Subtotal: {}", totals.subtotal);
    if totals.ships_free() {
        info!("Shipping: Free");
    } else {
        info!("Shipping: {}", totals.shipping_fee);
    }
    if let Some(remaining) = totals.free_shipping_remaining {
        info!("Spend {remaining} more for free shipping");
    }
    info!("Total: {} ({} items)", totals.total, totals.item_count);
}

/// Find `line_id` in the session's cart.
async fn owned_line(
    client: &BackendClient,
    token: &SessionToken,
    line_id: &str,
) -> Result<CartLineId, Box<dyn std::error::Error>> {
    let entries = client.get_cart(token).await?;
    entries
        .into_iter()
        .map(|entry| entry.cart_item.id)
        .find(|id| id.as_str() == line_id)
        .ok_or_else(|| CommandError::LineNotInCart(line_id.to_string()).into())
}

/// Print a fresh guest session token.
pub fn new_session() {
    info!("{}", SessionToken::generate());
}

/// Show the priced cart.
///
/// # Errors
///
/// Returns an error if the token is malformed or the backend cannot be reached.
pub async fn show(client: &BackendClient, session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let token = parse_session(session)?;
    let entries = client.get_cart(&token).await?;
    log_cart(&entries);
    Ok(())
}

/// Add a product in a size.
///
/// The size is checked against the product's stock before anything is
/// sent to the backend.
///
/// # Errors
///
/// Returns an error if the product does not exist, the size is unknown or
/// sold out, or the backend rejects the line.
pub async fn add(
    client: &BackendClient,
    session: &str,
    product_id: &str,
    size: &str,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = parse_session(session)?;
    let product = client.get_product(&ProductId::new(product_id)).await?;

    let mut selection = ProductSelection::new(&product);
    if !selection.select_size(&product, size) {
        return Err(CommandError::SizeUnavailable {
            product: product.name,
            size: size.to_string(),
        }
        .into());
    }
    let size = selection.begin_submit().map_err(CommandError::from)?;

    let line = AddCartLine {
        user_id: token,
        product_id: product.id.clone(),
        size,
        quantity,
    };

    let line = client.add_to_cart(&line).await?;
    info!(
        line_id = %line.id,
        "Added {} (size {}) - {} in cart",
        product.name,
        line.size,
        line.quantity
    );
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the line is not in this session's cart.
pub async fn update(
    client: &BackendClient,
    session: &str,
    line_id: &str,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = parse_session(session)?;
    let line_id = owned_line(client, &token, line_id).await?;
    client.update_cart_quantity(&line_id, quantity).await?;

    info!(line_id = %line_id, quantity, "Quantity updated");
    log_cart(&client.get_cart(&token).await?);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the line is not in this session's cart.
pub async fn remove(
    client: &BackendClient,
    session: &str,
    line_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = parse_session(session)?;
    let line_id = owned_line(client, &token, line_id).await?;
    client.remove_from_cart(&line_id).await?;

    info!(line_id = %line_id, "Item removed");
    log_cart(&client.get_cart(&token).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session() {
        assert!(parse_session("guest_abc123xyz").is_ok());
        assert!(matches!(
            parse_session("guest abc"),
            Err(CommandError::InvalidSession(_))
        ));
    }
}
