//! End-to-end tests for the storefront JSON API.
//!
//! Each test starts a fake backend and a storefront pointed at it, then
//! talks to the storefront over HTTP with a cookie-keeping client, the way
//! a browser would.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use kicks_core::{Price, Product};
use kicks_integration_tests::{FakeBackend, TestServer, sneaker, spawn_storefront};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct Shop {
    backend: FakeBackend,
    storefront: TestServer,
    http: reqwest::Client,
}

impl Shop {
    async fn open(products: Vec<Product>) -> Self {
        let backend = FakeBackend::with_products(products).await.unwrap();
        let storefront = spawn_storefront(&backend).await.unwrap();
        Self {
            backend,
            storefront,
            http: visitor(),
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.http.get(self.storefront.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        post_as(&self.http, &self.storefront, path, body).await
    }

    async fn add(&self, product_id: &str, size: &str) -> (StatusCode, Value) {
        self.post(
            "/api/cart/add",
            &json!({ "product_id": product_id, "size": size }),
        )
        .await
    }
}

fn visitor() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

async fn post_as(
    http: &reqwest::Client,
    server: &TestServer,
    path: &str,
    body: &Value,
) -> (StatusCode, Value) {
    let response = http.post(server.url(path)).json(body).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

fn catalog() -> Vec<Product> {
    vec![
        sneaker("runner", "Black", 50, &[("9", 3), ("10", 0)], false, 5),
        sneaker("court", "white", 120, &[("8", 5), ("9", 2)], true, 3),
        sneaker("trail", "black", 180, &[("11", 1)], true, 1),
    ]
}

fn product_ids(view: &Value) -> Vec<&str> {
    view["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let shop = Shop::open(catalog()).await;

    let response = shop.http.get(shop.storefront.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");

    let ready = shop.storefront.url("/health/ready");
    assert_eq!(shop.http.get(&ready).send().await.unwrap().status(), StatusCode::OK);

    shop.backend.set_unavailable(true);
    assert_eq!(
        shop.http.get(&ready).send().await.unwrap().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_unfiltered() {
    let shop = Shop::open(catalog()).await;

    let (status, view) = shop.get("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_ids(&view), ["trail", "court", "runner"]);
    assert_eq!(view["count"], 3);
    assert_eq!(view["colors"], json!(["black", "white", "Black"]));
}

#[tokio::test]
async fn test_catalog_color_is_case_insensitive() {
    let shop = Shop::open(catalog()).await;

    let (_, view) = shop.get("/api/products?color=BLACK").await;
    assert_eq!(product_ids(&view), ["trail", "runner"]);
    assert_eq!(view["colors"], json!(["black", "white", "Black"]));
}

#[tokio::test]
async fn test_catalog_price_range_is_inclusive() {
    let shop = Shop::open(catalog()).await;

    let (_, view) = shop.get("/api/products?min_price=50&max_price=120").await;
    assert_eq!(product_ids(&view), ["court", "runner"]);

    let (_, view) = shop
        .get("/api/products?color=black&min_price=100&max_price=")
        .await;
    assert_eq!(product_ids(&view), ["trail"]);
}

#[tokio::test]
async fn test_catalog_ignores_unparseable_bounds() {
    let shop = Shop::open(catalog()).await;

    let (status, view) = shop.get("/api/products?min_price=cheap&max_price=lots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["count"], 3);
}

#[tokio::test]
async fn test_catalog_no_match() {
    let shop = Shop::open(catalog()).await;

    let (status, view) = shop.get("/api/products?color=purple").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["count"], 0);
    assert!(view["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_featured_products() {
    let shop = Shop::open(catalog()).await;

    let (status, featured) = shop.get("/api/products/featured").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = featured
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["trail", "court"]);
}

#[tokio::test]
async fn test_product_detail() {
    let shop = Shop::open(catalog()).await;

    let (status, product) = shop.get("/api/products/runner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["price_display"], "$50.00");
    assert_eq!(
        product["sizes"],
        json!([
            { "size": "9", "stock": 3, "available": true },
            { "size": "10", "stock": 0, "available": false },
        ])
    );

    let (status, body) = shop.get("/api/products/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn test_catalog_backend_down() {
    let shop = Shop::open(catalog()).await;
    shop.backend.set_unavailable(true);

    let (status, body) = shop.get("/api/products").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to load products");
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_new_visitor_has_empty_cart() {
    let shop = Shop::open(catalog()).await;

    let (_, count) = shop.get("/api/cart/count").await;
    assert_eq!(count["count"], 0);

    let (status, cart) = shop.get("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["total_display"], "$0.00");
}

#[tokio::test]
async fn test_add_to_cart_merges_and_prices() {
    let shop = Shop::open(catalog()).await;

    let (status, added) = shop.add("runner", "9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["message"], "Added to cart");
    assert_eq!(added["confirm_for_ms"], 2_000);
    assert!(added["line"]["user_id"].as_str().unwrap().starts_with("guest_"));

    let (_, cart) = shop.get("/api/cart").await;
    assert_eq!(cart["subtotal_display"], "$50.00");
    assert_eq!(cart["shipping_display"], "$15.00");
    assert_eq!(cart["total_display"], "$65.00");

    shop.add("runner", "9").await;
    let (_, cart) = shop.get("/api/cart").await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["subtotal_display"], "$100.00");
    assert_eq!(cart["shipping_display"], "$15.00");
    assert_eq!(cart["total_display"], "$115.00");
    assert_eq!(cart["totals"]["free_shipping_remaining"], 100.0);

    let (_, count) = shop.get("/api/cart/count").await;
    assert_eq!(count["count"], 2);
}

#[tokio::test]
async fn test_add_rejects_unavailable_sizes() {
    let shop = Shop::open(catalog()).await;

    let (status, body) = shop.add("runner", "10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Size 10 is not available");

    let (status, _) = shop.add("runner", "13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .post(
            "/api/cart/add",
            &json!({ "product_id": "runner", "size": "9", "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = shop.add("missing", "9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    assert!(shop.backend.cart_lines().is_empty());
}

#[tokio::test]
async fn test_update_and_remove_line() {
    let shop = Shop::open(catalog()).await;

    let (_, added) = shop.add("court", "8").await;
    let line_id = added["line"]["id"].as_str().unwrap().to_string();

    let (status, cart) = shop
        .post(
            "/api/cart/update",
            &json!({ "line_id": line_id, "quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totals"]["item_count"], 3);
    assert_eq!(cart["total_display"], "$360.00");

    let (status, _) = shop
        .post(
            "/api/cart/update",
            &json!({ "line_id": line_id, "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = shop
        .post("/api/cart/remove", &json!({ "line_id": line_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["shipping_display"], "Free");
}

#[tokio::test]
async fn test_cart_lines_belong_to_their_session() {
    let shop = Shop::open(catalog()).await;

    let (_, added) = shop.add("court", "8").await;
    let line_id = added["line"]["id"].as_str().unwrap().to_string();

    let stranger = visitor();
    let (status, body) = post_as(
        &stranger,
        &shop.storefront,
        "/api/cart/remove",
        &json!({ "line_id": line_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cart item not found");

    assert_eq!(shop.backend.cart_lines().len(), 1);
}

#[tokio::test]
async fn test_cart_uses_current_prices() {
    let shop = Shop::open(catalog()).await;

    shop.add("court", "9").await;
    let (_, cart) = shop.get("/api/cart").await;
    assert_eq!(cart["total_display"], "$135.00");

    shop.backend.set_price("court", Price::from_dollars(80));
    let (_, cart) = shop.get("/api/cart").await;
    assert_eq!(cart["items"][0]["line_total_display"], "$80.00");
    assert_eq!(cart["total_display"], "$95.00");
}

#[tokio::test]
async fn test_cart_count_survives_backend_outage() {
    let shop = Shop::open(catalog()).await;
    shop.add("court", "8").await;

    shop.backend.set_unavailable(true);
    let (status, count) = shop.get("/api/cart/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 0);

    let (status, body) = shop.get("/api/cart").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to load cart");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout() {
    let shop = Shop::open(catalog()).await;

    let (status, body) = shop.post("/api/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Your cart is empty");

    shop.add("trail", "11").await;
    let (status, body) = shop.post("/api/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "Checkout is not available yet");
}

// =============================================================================
// Drops
// =============================================================================

#[tokio::test]
async fn test_subscribe() {
    let shop = Shop::open(Vec::new()).await;

    let (status, body) = shop
        .post(
            "/api/drops/subscribe",
            &json!({ "email": "  Fan@Example.com " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "fan@example.com");

    let (status, again) = shop
        .post("/api/drops/subscribe", &json!({ "email": "fan@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["subscribed_at"], body["subscribed_at"]);

    let (status, body) = shop
        .post("/api/drops/subscribe", &json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a valid email address");
}
