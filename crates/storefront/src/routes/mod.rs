//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Products
//! GET  /api/products           - Catalog (?color=&min_price=&max_price=&featured=)
//! GET  /api/products/featured  - Featured products for the landing page
//! GET  /api/products/{id}      - Product detail with size availability
//!
//! # Cart
//! GET  /api/cart               - Priced cart
//! GET  /api/cart/count         - Item count for the badge
//! POST /api/cart/add           - Add a product in a size
//! POST /api/cart/update        - Change a line's quantity
//! POST /api/cart/remove        - Remove a line
//!
//! # Checkout
//! POST /api/checkout           - Not available yet (400 on empty cart, else 501)
//!
//! # Drops
//! POST /api/drops/subscribe    - Subscribe to drop announcements
//! ```

pub mod cart;
pub mod newsletter;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(cart::checkout))
        .route("/api/drops/subscribe", post(newsletter::subscribe))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Backend not ready: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
