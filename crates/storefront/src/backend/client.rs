//! Backend REST client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kicks_core::{
    AddCartLine, CartEntry, CartLine, CartLineId, Email, NewProduct, Product, ProductId,
    ProductUpdate, SessionToken, Subscriber,
};
use moka::future::Cache;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::BackendError;
use super::cache::{CacheKey, CacheValue};
use crate::config::BackendConfig;

/// Maximum number of cached product reads.
const CACHE_CAPACITY: u64 = 1000;

/// How much of a response body goes into logs.
const LOG_BODY_CHARS: usize = 500;

/// How much of an unstructured error body is kept in an error message.
const ERROR_BODY_CHARS: usize = 200;

/// Product list filters applied by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Only featured (`Some(true)`) or only non-featured (`Some(false)`) products.
    pub featured: Option<bool>,
}

impl ProductQuery {
    /// Every product.
    #[must_use]
    pub const fn all() -> Self {
        Self { featured: None }
    }

    /// Products flagged for the landing page.
    #[must_use]
    pub const fn featured() -> Self {
        Self {
            featured: Some(true),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the Kicks REST backend.
///
/// Products are cached for the configured TTL; any product mutation made
/// through this client clears the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
    /// Bumped on every product mutation.
    generation: AtomicU64,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidBaseUrl` if the API URL cannot take a
    /// path, or `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.api_url.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl(config.api_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
                generation: AtomicU64::new(0),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build the URL for `segments` below the base URL.
    ///
    /// Segments are percent-encoded, so identifiers cannot escape their
    /// path position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(error_detail(&body)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body, LOG_BODY_CHARS),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_CHARS),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn invalidate_products(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cache.invalidate_all();
        debug!("Product cache invalidated");
    }

    /// Cache a read started at `generation`, unless a product mutation has
    /// happened since.
    ///
    /// The generation is checked again after the insert: a mutation that
    /// lands in between either sees the entry in its `invalidate_all` or is
    /// seen here.
    async fn cache_if_current(&self, key: CacheKey, value: CacheValue, generation: u64) {
        if self.generation() != generation {
            debug!("Skipping cache insert for a read that raced a mutation");
            return;
        }
        self.inner.cache.insert(key.clone(), value).await;
        if self.generation() != generation {
            self.inner.cache.invalidate(&key).await;
        }
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = self.endpoint(&[""])?;
        self.send(self.inner.client.get(url)).await.map(|_| ())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, BackendError> {
        let cache_key = CacheKey::Products {
            featured: query.featured,
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        if let Some(featured) = query.featured {
            url.query_pairs_mut()
                .append_pair("featured", if featured { "true" } else { "false" });
        }

        let generation = self.generation();
        let products: Vec<Product> = self.execute(self.inner.client.get(url)).await?;

        self.cache_if_current(cache_key, CacheValue::Products(products.clone()), generation)
            .await;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let generation = self.generation();
        let product: Product = self.execute(self.inner.client.get(url)).await?;

        self.cache_if_current(
            cache_key,
            CacheValue::Product(Box::new(product.clone())),
            generation,
        )
        .await;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, BackendError> {
        let url = self.endpoint(&["products"])?;
        let created: Product = self
            .execute(self.inner.client.post(url).json(product))
            .await?;
        self.invalidate_products();
        Ok(created)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no product has this ID.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, BackendError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let updated: Product = self
            .execute(self.inner.client.put(url).json(update))
            .await?;
        self.invalidate_products();
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.send(self.inner.client.delete(url)).await?;
        self.invalidate_products();
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Get the cart for a guest token, with every line's current product.
    ///
    /// Lines whose product no longer exists are omitted by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SessionToken) -> Result<Vec<CartEntry>, BackendError> {
        let url = self.endpoint(&["cart", token.as_str()])?;
        self.execute(self.inner.client.get(url)).await
    }

    /// Add a line to a cart.
    ///
    /// The backend merges the line into an existing one with the same
    /// product and size.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(
        skip(self, line),
        fields(product_id = %line.product_id, size = %line.size, quantity = line.quantity)
    )]
    pub async fn add_to_cart(&self, line: &AddCartLine) -> Result<CartLine, BackendError> {
        let url = self.endpoint(&["cart", "add"])?;
        self.execute(self.inner.client.post(url).json(line)).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the line does not exist and
    /// `BackendError::Api` if the backend rejects the quantity.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn update_cart_quantity(
        &self,
        id: &CartLineId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let mut url = self.endpoint(&["cart", id.as_str(), "quantity"])?;
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());
        self.send(self.inner.client.put(url)).await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the line does not exist.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn remove_from_cart(&self, id: &CartLineId) -> Result<(), BackendError> {
        let url = self.endpoint(&["cart", id.as_str()])?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    // =========================================================================
    // Drops
    // =========================================================================

    /// Subscribe an email to drop announcements.
    ///
    /// Subscribing an address twice returns the existing subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self, email), fields(domain = %email.domain()))]
    pub async fn subscribe(&self, email: &Email) -> Result<Subscriber, BackendError> {
        let url = self.endpoint(&["drops", "subscribe"])?;
        let body = serde_json::json!({ "email": email });
        self.execute(self.inner.client.post(url).json(&body)).await
    }

    /// List drop subscribers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>, BackendError> {
        let url = self.endpoint(&["drops", "subscribers"])?;
        self.execute(self.inner.client.get(url)).await
    }
}

/// Pull the human-readable message out of an error body.
///
/// The backend reports errors as `{"detail": ...}`; anything else is kept
/// verbatim, truncated.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => truncate(body, ERROR_BODY_CHARS),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
