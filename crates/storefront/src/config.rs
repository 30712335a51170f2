//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `MARIGOLD_HOST` - Bind address (default: 127.0.0.1)
//! - `MARIGOLD_PORT` - Listen port (default: 3000)
//! - `MARIGOLD_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: <http://localhost:3000>)
//! - `MARIGOLD_DATA_DIR` - Directory for file-backed snapshots (default: in-memory)
//! - `MARIGOLD_CATALOG_PATH` - JSON product catalog (default: built-in catalog)
//! - `MARIGOLD_DEVICE_IDLE_SECS` - Evict idle devices after this long (default: 604800)
//! - `MARIGOLD_CURRENCY` - Display currency (default: INR)
//! - `MARIGOLD_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 1000)
//! - `MARIGOLD_FLAT_SHIPPING` - Shipping charged below the threshold (default: 100)
//! - `MARIGOLD_TAX_RATE` - Tax as a fraction of the subtotal (default: 0.18)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use marigold_core::CurrencyCode;

use crate::checkout::CheckoutConfig;

/// Seven days.
const DEFAULT_DEVICE_IDLE_SECS: u64 = 7 * 24 * 60 * 60;

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
    pub base_url: String,
    /// Snapshot directory; `None` keeps snapshots in memory
    pub data_dir: Option<PathBuf>,
    /// Catalog file; `None` serves the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// How long an unused device session is kept
    pub device_idle: Duration,
    /// Checkout pricing rules
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let checkout = CheckoutConfig {
            currency: env.parse_or("MARIGOLD_CURRENCY", CurrencyCode::default())?,
            free_shipping_threshold: env
                .parse_or("MARIGOLD_FREE_SHIPPING_THRESHOLD", Decimal::from(1000))?,
            flat_shipping: env.parse_or("MARIGOLD_FLAT_SHIPPING", Decimal::from(100))?,
            tax_rate: env.parse_or("MARIGOLD_TAX_RATE", Decimal::new(18, 2))?,
        };
        if checkout.tax_rate.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "MARIGOLD_TAX_RATE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            host: env.parse_or("MARIGOLD_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parse_or("MARIGOLD_PORT", 3000)?,
            base_url: env.get_or("MARIGOLD_BASE_URL", "http://localhost:3000"),
            data_dir: env.get("MARIGOLD_DATA_DIR").map(PathBuf::from),
            catalog_path: env.get("MARIGOLD_CATALOG_PATH").map(PathBuf::from),
            device_idle: Duration::from_secs(
                env.parse_or("MARIGOLD_DEVICE_IDLE_SECS", DEFAULT_DEVICE_IDLE_SECS)?,
            ),
            checkout,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            data_dir: None,
            catalog_path: None,
            device_idle: Duration::from_secs(DEFAULT_DEVICE_IDLE_SECS),
            checkout: CheckoutConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when it is unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
