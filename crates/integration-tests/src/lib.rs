//! Integration tests for Kicks.
//!
//! Tests run the storefront and the backend client against [`FakeBackend`],
//! an in-memory implementation of the REST backend served on a random
//! local port. Nothing external has to be running.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kicks-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `backend_client` - REST client against the fake backend
//! - `storefront_api` - Storefront JSON API end to end

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use kicks_core::{
    AddCartLine, CartEntry, CartLine, CartLineId, Email, NewProduct, Price, Product, ProductId,
    ProductUpdate, Size, Subscriber, SubscriberId,
};
use kicks_storefront::config::StorefrontConfig;
use kicks_storefront::state::AppState;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// An HTTP server bound to `127.0.0.1` on a free port.
///
/// The server task is aborted when this is dropped.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `router` in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(router: Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { addr, handle })
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct Store {
    products: Vec<Product>,
    cart: Vec<CartLine>,
    subscribers: Vec<Subscriber>,
    unavailable: bool,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Store>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory REST backend speaking the same contract as the real one.
pub struct FakeBackend {
    store: Shared,
    api_url: Url,
    _server: TestServer,
}

impl FakeBackend {
    /// Start an empty backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let store = Shared::default();
        let server = TestServer::spawn(fake_routes(store.clone())).await?;
        let api_url = Url::parse(&server.url("/api"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(Self {
            store,
            api_url,
            _server: server,
        })
    }

    /// Start a backend seeded with `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn with_products(products: Vec<Product>) -> std::io::Result<Self> {
        let backend = Self::start().await?;
        backend.store.lock().products = products;
        Ok(backend)
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api`.
    #[must_use]
    pub const fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Answer every request with 503 while `unavailable` is set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.store.lock().unavailable = unavailable;
    }

    /// Change a product's price behind the storefront's back.
    pub fn set_price(&self, id: &str, price: Price) {
        let mut store = self.store.lock();
        if let Some(product) = store.products.iter_mut().find(|p| p.id.as_str() == id) {
            product.price = price;
        }
    }

    /// Delete a product without touching cart lines that refer to it.
    pub fn remove_product(&self, id: &str) {
        self.store.lock().products.retain(|p| p.id.as_str() != id);
    }

    /// All stored cart lines, across sessions.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.store.lock().cart.clone()
    }
}

/// A sneaker with the given sizes, created `age_days` ago.
#[must_use]
pub fn sneaker(
    id: &str,
    color: &str,
    dollars: u32,
    sizes: &[(&str, u32)],
    featured: bool,
    age_days: i64,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Sneaker {id}"),
        description: format!("The {color} {id}"),
        price: Price::from_dollars(dollars),
        images: vec![format!("https://cdn.example.com/{id}.jpg")],
        category: "sneakers".to_string(),
        color: color.to_string(),
        sizes: sizes
            .iter()
            .map(|(size, stock)| Size::new(*size, *stock))
            .collect(),
        featured,
        created_at: Some(seed_time() - Duration::days(age_days)),
    }
}

fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn success(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": message }))
}

fn fake_routes(store: Shared) -> Router {
    Router::new()
        .route("/api/", get(root))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/cart/{id}", get(get_cart).delete(remove_from_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/{id}/quantity", put(update_quantity))
        .route("/api/drops/subscribe", post(subscribe))
        .route("/api/drops/subscribers", get(list_subscribers))
        .route_layer(middleware::from_fn_with_state(store.clone(), availability))
        .with_state(store)
}

async fn availability(State(store): State<Shared>, request: Request, next: Next) -> Response {
    let unavailable = store.lock().unavailable;
    if unavailable {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Database not ready");
    }
    next.run(request).await
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Kicks API" }))
}

#[derive(Deserialize)]
struct ProductFilter {
    featured: Option<bool>,
}

async fn list_products(
    State(store): State<Shared>,
    Query(filter): Query<ProductFilter>,
) -> Json<Vec<Product>> {
    let mut products: Vec<Product> = store
        .lock()
        .products
        .iter()
        .filter(|p| filter.featured.is_none_or(|featured| p.featured == featured))
        .cloned()
        .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(products)
}

async fn create_product(State(store): State<Shared>, Json(new): Json<NewProduct>) -> Json<Product> {
    let product = Product {
        id: ProductId::new(uuid::Uuid::new_v4().to_string()),
        name: new.name,
        description: new.description,
        price: new.price,
        images: new.images,
        category: new.category,
        color: new.color,
        sizes: new.sizes,
        featured: new.featured,
        created_at: Some(Utc::now()),
    };
    store.lock().products.push(product.clone());
    Json(product)
}

async fn get_product(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    match store.lock().products.iter().find(|p| p.id.as_str() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn update_product(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Response {
    let mut store = store.lock();
    let Some(product) = store.products.iter_mut().find(|p| p.id.as_str() == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };

    if let Some(name) = update.name {
        product.name = name;
    }
    if let Some(description) = update.description {
        product.description = description;
    }
    if let Some(price) = update.price {
        product.price = price;
    }
    if let Some(images) = update.images {
        product.images = images;
    }
    if let Some(category) = update.category {
        product.category = category;
    }
    if let Some(color) = update.color {
        product.color = color;
    }
    if let Some(sizes) = update.sizes {
        product.sizes = sizes;
    }
    if let Some(featured) = update.featured {
        product.featured = featured;
    }
    Json(product.clone()).into_response()
}

async fn delete_product(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    let mut store = store.lock();
    let before = store.products.len();
    store.products.retain(|p| p.id.as_str() != id);
    if store.products.len() == before {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }
    success("Product deleted").into_response()
}

async fn get_cart(State(store): State<Shared>, Path(user_id): Path<String>) -> Json<Vec<CartEntry>> {
    let store = store.lock();
    let entries = store
        .cart
        .iter()
        .filter(|line| line.user_id.as_str() == user_id)
        .filter_map(|line| {
            let product = store.products.iter().find(|p| p.id == line.product_id)?;
            Some(CartEntry {
                cart_item: line.clone(),
                product: product.clone(),
            })
        })
        .collect();
    Json(entries)
}

async fn add_to_cart(State(store): State<Shared>, Json(add): Json<AddCartLine>) -> Response {
    if add.quantity < 1 {
        return detail(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut store = store.lock();
    if let Some(line) = store.cart.iter_mut().find(|line| {
        line.user_id == add.user_id && line.product_id == add.product_id && line.size == add.size
    }) {
        line.quantity += add.quantity;
        return Json(line.clone()).into_response();
    }

    let line = CartLine {
        id: CartLineId::new(uuid::Uuid::new_v4().to_string()),
        user_id: add.user_id,
        product_id: add.product_id,
        size: add.size,
        quantity: add.quantity,
        added_at: Some(Utc::now()),
    };
    store.cart.push(line.clone());
    Json(line).into_response()
}

#[derive(Deserialize)]
struct QuantityParam {
    quantity: i64,
}

async fn update_quantity(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Query(param): Query<QuantityParam>,
) -> Response {
    let Ok(quantity) = u32::try_from(param.quantity) else {
        return detail(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    };
    if quantity < 1 {
        return detail(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut store = store.lock();
    let Some(line) = store.cart.iter_mut().find(|line| line.id.as_str() == id) else {
        return detail(StatusCode::NOT_FOUND, "Cart item not found");
    };
    line.quantity = quantity;
    success("Quantity updated").into_response()
}

async fn remove_from_cart(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    let mut store = store.lock();
    let before = store.cart.len();
    store.cart.retain(|line| line.id.as_str() != id);
    if store.cart.len() == before {
        return detail(StatusCode::NOT_FOUND, "Cart item not found");
    }
    success("Item removed from cart").into_response()
}

#[derive(Deserialize)]
struct SubscribeBody {
    email: String,
}

async fn subscribe(State(store): State<Shared>, Json(body): Json<SubscribeBody>) -> Response {
    let Ok(email) = Email::parse(&body.email) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "value is not a valid email address");
    };

    let mut store = store.lock();
    if let Some(existing) = store.subscribers.iter().find(|s| s.email == email) {
        return Json(existing.clone()).into_response();
    }

    let subscriber = Subscriber {
        id: SubscriberId::new(uuid::Uuid::new_v4().to_string()),
        email,
        subscribed_at: Utc::now(),
    };
    store.subscribers.push(subscriber.clone());
    Json(subscriber).into_response()
}

async fn list_subscribers(State(store): State<Shared>) -> Json<Vec<Subscriber>> {
    let mut subscribers = store.lock().subscribers.clone();
    subscribers.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
    Json(subscribers)
}

// =============================================================================
// Storefront
// =============================================================================

/// Start the storefront with its default configuration, talking to `backend`.
///
/// # Errors
///
/// Returns an error if the configuration is rejected or no port can be bound.
pub async fn spawn_storefront(
    backend: &FakeBackend,
) -> Result<TestServer, Box<dyn std::error::Error>> {
    let api_url = backend.api_url().to_string();
    let config = StorefrontConfig::from_vars(|key| match key {
        "KICKS_API_URL" => Some(api_url.clone()),
        _ => None,
    })?;
    let state = AppState::new(config)?;
    Ok(TestServer::spawn(kicks_storefront::app(state)).await?)
}
