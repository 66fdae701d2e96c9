//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `KICKS_API_URL` - Backend REST API base URL (default: <http://localhost:8001/api>)
//! - `KICKS_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `KICKS_CACHE_TTL_SECS` - Product cache lifetime (default: 60)
//! - `KICKS_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free, in dollars (default: 200)
//! - `KICKS_FLAT_SHIPPING_FEE` - Shipping below the threshold, in dollars (default: 15)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL; `https` enables secure cookies (default: <http://localhost:3000>)
//! - `STOREFRONT_CORS_ORIGIN` - Origin allowed to call the JSON API from a browser
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use kicks_core::{Price, ShippingPolicy};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Backend base URL used when `KICKS_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Browser origin allowed by CORS, if any
    pub cors_origin: Option<String>,
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Shipping rules used to price carts
    pub shipping: ShippingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to
    pub api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product reads are cached
    pub cache_ttl: Duration,
}

impl BackendConfig {
    /// Configuration pointing at `api_url` with default timeout and cache TTL.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_env(&vars, "STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env(&vars, "STOREFRONT_PORT", 3000_u16)?;
        let base_url = get_url(&vars, "STOREFRONT_BASE_URL", "http://localhost:3000")?;
        let cors_origin = get_optional_env(&vars, "STOREFRONT_CORS_ORIGIN");

        let backend = BackendConfig {
            api_url: get_url(&vars, "KICKS_API_URL", DEFAULT_API_URL)?,
            timeout: Duration::from_secs(parse_env(&vars, "KICKS_API_TIMEOUT_SECS", 10_u64)?),
            cache_ttl: Duration::from_secs(parse_env(&vars, "KICKS_CACHE_TTL_SECS", 60_u64)?),
        };

        let defaults = ShippingPolicy::default();
        let shipping = ShippingPolicy {
            free_shipping_threshold: get_price(
                &vars,
                "KICKS_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            flat_fee: get_price(&vars, "KICKS_FLAT_SHIPPING_FEE", defaults.flat_fee)?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            cors_origin,
            backend,
            shipping,
            sentry_dsn: get_optional_env(&vars, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&vars, "SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_sample_rate(&vars, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_sample_rate(&vars, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    vars(key).filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_optional_env(vars, key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Get a URL environment variable with a default.
fn get_url(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Url, ConfigError> {
    let value = get_optional_env(vars, key).unwrap_or_else(|| default.to_string());
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Get a dollar amount environment variable with a default.
fn get_price(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Price,
) -> Result<Price, ConfigError> {
    let Some(value) = get_optional_env(vars, key) else {
        return Ok(default);
    };
    let amount = Decimal::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Price::new(amount).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a sample rate between 0.0 and 1.0.
fn get_sample_rate(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let rate = parse_env(vars, key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.backend.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert_eq!(config.backend.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert!(!config.secure_cookies());
        assert!(config.sentry_dsn.is_none());
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_BASE_URL", "https://kicks.example.com"),
            ("KICKS_API_URL", "https://api.example.com/api"),
            ("KICKS_CACHE_TTL_SECS", "5"),
            ("KICKS_FREE_SHIPPING_THRESHOLD", "150.50"),
            ("KICKS_FLAT_SHIPPING_FEE", "9.99"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.secure_cookies());
        assert_eq!(config.backend.api_url.host_str(), Some("api.example.com"));
        assert_eq!(config.backend.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.shipping.free_shipping_threshold, Price::from_cents(15_050));
        assert_eq!(config.shipping.flat_fee, Price::from_cents(999));
        assert!((config.sentry_traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("STOREFRONT_PORT", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(load(&[("KICKS_API_URL", "not a url")]).is_err());
        assert!(load(&[("KICKS_API_URL", "mailto:ops@example.com")]).is_err());
    }

    #[test]
    fn test_negative_shipping_fee_rejected() {
        let err = load(&[("KICKS_FLAT_SHIPPING_FEE", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "KICKS_FLAT_SHIPPING_FEE"));
    }

    #[test]
    fn test_sample_rate_range() {
        assert!(load(&[("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }
}
