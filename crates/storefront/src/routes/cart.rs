//! Cart route handlers.
//!
//! The cart belongs to the visitor's guest token, kept in the session. The
//! backend resolves each line's product on every read, so the totals shown
//! here always use current prices.

use axum::{Json, extract::State};
use kicks_core::selection::ADDED_DISPLAY;
use kicks_core::{
    AddCartLine, CartEntry, CartLine, CartLineId, CartTotals, Price, Product, ProductId,
    ProductSelection, SelectionError, SessionToken, ShippingPolicy,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{get_guest_token, get_or_issue_guest_token};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub line_total_display: String,
}

impl From<&CartEntry> for CartItemView {
    fn from(entry: &CartEntry) -> Self {
        let line_total = entry.line_total();
        Self {
            id: entry.cart_item.id.clone(),
            product_id: entry.product.id.clone(),
            name: entry.product.name.clone(),
            image: entry.product.primary_image().map(String::from),
            color: entry.product.color.clone(),
            size: entry.cart_item.size.clone(),
            quantity: entry.cart_item.quantity,
            unit_price: entry.product.price,
            line_total,
            line_total_display: line_total.display(),
        }
    }
}

/// Priced cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub totals: CartTotals,
    pub subtotal_display: String,
    pub shipping_display: String,
    pub total_display: String,
}

impl CartView {
    /// Price `entries` under `policy`.
    #[must_use]
    pub fn build(entries: &[CartEntry], policy: &ShippingPolicy) -> Self {
        let totals = policy.price(entries);
        Self {
            items: entries.iter().map(CartItemView::from).collect(),
            subtotal_display: totals.subtotal.display(),
            shipping_display: if totals.ships_free() {
                "Free".to_string()
            } else {
                totals.shipping_fee.display()
            },
            total_display: totals.total.display(),
            totals,
        }
    }

    /// A cart with no lines.
    #[must_use]
    pub fn empty(policy: &ShippingPolicy) -> Self {
        Self::build(&[], policy)
    }
}

/// Cart badge count.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Confirmation returned after adding to the cart.
#[derive(Debug, Clone, Serialize)]
pub struct AddedToCart {
    pub line: CartLine,
    pub message: &'static str,
    /// How long to show the confirmation before re-enabling the button.
    pub confirm_for_ms: u64,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub size: String,
    pub quantity: Option<u32>,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub line_id: String,
}

/// Fetch the session's cart lines; no token means an empty cart.
async fn load_cart(
    state: &AppState,
    token: Option<&SessionToken>,
    notice: &'static str,
) -> Result<Vec<CartEntry>> {
    let Some(token) = token else {
        return Ok(Vec::new());
    };
    state
        .backend()
        .get_cart(token)
        .await
        .map_err(AppError::action(notice))
}

/// Make sure `line_id` is in this session's cart before touching it.
async fn owned_line(
    state: &AppState,
    session: &Session,
    line_id: &str,
    notice: &'static str,
) -> Result<CartLineId> {
    let token = get_guest_token(session).await;
    let entries = load_cart(state, token.as_ref(), notice).await?;
    entries
        .iter()
        .map(|entry| &entry.cart_item.id)
        .find(|id| id.as_str() == line_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Cart item".to_string()))
}

/// Re-read and price the session's cart.
async fn current_cart(state: &AppState, session: &Session) -> Result<CartView> {
    let token = get_guest_token(session).await;
    let entries = load_cart(state, token.as_ref(), "Failed to load cart").await?;
    Ok(CartView::build(&entries, state.shipping()))
}

/// Run the requested size through the product's selection: unknown and
/// sold-out sizes are rejected.
fn selected_size(product: &Product, requested: &str) -> Result<String> {
    let requested = requested.trim();
    let mut selection = ProductSelection::new(product);
    if !selection.select_size(product, requested) {
        return Err(AppError::BadRequest(format!(
            "Size {requested} is not available"
        )));
    }
    selection.begin_submit().map_err(|e| match e {
        SelectionError::NoSizeSelected => AppError::BadRequest("Please select a size".to_string()),
        SelectionError::Busy => AppError::Internal(e.to_string()),
    })
}

/// Display the priced cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    Ok(Json(current_cart(&state, &session).await?))
}

/// Number of items in the cart, for the navigation badge.
///
/// A failing backend shows an empty badge rather than an error.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Json<CartCount> {
    let count = match get_guest_token(&session).await {
        Some(token) => match state.backend().get_cart(&token).await {
            Ok(entries) => state.shipping().price(&entries).item_count,
            Err(e) => {
                tracing::warn!("Failed to fetch cart count: {e}");
                0
            }
        },
        None => 0,
    };

    Json(CartCount { count })
}

/// Add a product in a size to the cart.
///
/// The size must exist and be in stock; a rejected size never reaches the
/// backend. The selection lives only for this request, so the confirmation
/// window is handed back to the client as `confirm_for_ms`.
#[instrument(skip(state, session), fields(product_id = %request.product_id, size = %request.size))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<AddedToCart>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = state
        .backend()
        .get_product(&ProductId::new(request.product_id))
        .await
        .map_err(AppError::lookup("Product", "Failed to add to cart"))?;

    let size = selected_size(&product, &request.size)?;

    let token = get_or_issue_guest_token(&session).await?;
    let line = AddCartLine {
        user_id: token,
        product_id: product.id.clone(),
        size,
        quantity,
    };

    let line = state
        .backend()
        .add_to_cart(&line)
        .await
        .map_err(AppError::action("Failed to add to cart"))?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", line.product_id.as_str()),
            ("size", line.size.as_str()),
        ]),
    );
    tracing::info!(line_id = %line.id, quantity = line.quantity, "Added to cart");
    Ok(Json(AddedToCart {
        line,
        message: "Added to cart",
        confirm_for_ms: u64::try_from(ADDED_DISPLAY.as_millis()).unwrap_or(u64::MAX),
    }))
}

/// Change a line's quantity; returns the re-priced cart.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    if request.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let line_id = owned_line(&state, &session, &request.line_id, "Failed to update cart").await?;
    state
        .backend()
        .update_cart_quantity(&line_id, request.quantity)
        .await
        .map_err(AppError::action("Failed to update cart"))?;

    Ok(Json(current_cart(&state, &session).await?))
}

/// Remove a line; returns the re-priced cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let line_id = owned_line(&state, &session, &request.line_id, "Failed to remove item").await?;
    state
        .backend()
        .remove_from_cart(&line_id)
        .await
        .map_err(AppError::action("Failed to remove item"))?;

    Ok(Json(current_cart(&state, &session).await?))
}

/// Checkout.
///
/// Payment is not wired up: an empty cart is rejected and anything else
/// answers 501.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = current_cart(&state, &session).await?;
    if cart.items.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }

    tracing::info!(
        total = %cart.totals.total,
        items = cart.totals.item_count,
        "Checkout requested"
    );
    Err(AppError::NotImplemented(
        "Checkout is not available yet".to_string(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kicks_core::Size;

    use super::*;

    fn entry(line: &str, dollars: u32, quantity: u32) -> CartEntry {
        let product_id = ProductId::new(format!("p-{line}"));
        CartEntry {
            cart_item: CartLine {
                id: CartLineId::new(line),
                user_id: SessionToken::parse("guest_test").unwrap(),
                product_id: product_id.clone(),
                size: "10".to_string(),
                quantity,
                added_at: None,
            },
            product: Product {
                id: product_id,
                name: "Runner".to_string(),
                description: "test".to_string(),
                price: Price::from_dollars(dollars),
                images: vec!["https://cdn.example.com/r.jpg".to_string()],
                category: "sneakers".to_string(),
                color: "black".to_string(),
                sizes: vec![Size::new("10", 4)],
                featured: false,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty(&ShippingPolicy::default());
        assert!(view.items.is_empty());
        assert_eq!(view.total_display, "$0.00");
        assert_eq!(view.shipping_display, "Free");
    }

    #[test]
    fn test_cart_view_below_threshold() {
        let view = CartView::build(&[entry("a", 50, 1)], &ShippingPolicy::default());
        assert_eq!(view.subtotal_display, "$50.00");
        assert_eq!(view.shipping_display, "$15.00");
        assert_eq!(view.total_display, "$65.00");
        assert_eq!(view.items.first().unwrap().line_total_display, "$50.00");
    }

    #[test]
    fn test_cart_view_free_shipping() {
        let view = CartView::build(
            &[entry("a", 100, 1), entry("b", 50, 2)],
            &ShippingPolicy::default(),
        );
        assert_eq!(view.totals.item_count, 3);
        assert_eq!(view.total_display, "$200.00");
        assert_eq!(view.shipping_display, "Free");
    }

    #[test]
    fn test_selected_size() {
        let mut product = entry("a", 90, 1).product;
        product.sizes = vec![Size::new("9", 2), Size::new("10", 0)];

        assert_eq!(selected_size(&product, " 9 ").unwrap(), "9");
        assert!(matches!(
            selected_size(&product, "10"),
            Err(AppError::BadRequest(message)) if message == "Size 10 is not available"
        ));
        assert!(matches!(
            selected_size(&product, "13"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_added_confirmation_window() {
        assert_eq!(
            u64::try_from(ADDED_DISPLAY.as_millis()).unwrap(),
            2_000
        );
    }
}
