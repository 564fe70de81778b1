//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//! - `SHIPWIRE_USERNAME` / `SHIPWIRE_PASSWORD` - only when `SHIPWIRE_ENABLED=true`
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_GUEST_CUSTOMER_ID` - Customer that authors anonymous carts (default: 1)
//! - `STOREFRONT_VIEWS` - Comma-separated named views to render (default: `cart-summary,checkout-totals`)
//! - `STOREFRONT_TAX_PERCENT` - Flat tax percentage (default: 8)
//! - `SHIPWIRE_ENABLED` - Enable the shipping vendor (default: false)
//! - `SHIPWIRE_SERVER` - `Production` or `Test` (default: Production)
//! - `SHIPWIRE_BASE_URL` - Vendor endpoint root (default: <https://api.shipwire.com>)
//! - `SHIPWIRE_AFFILIATE_ID` - Affiliate id sent with fulfillment orders
//! - `STRIPE_CURRENCY` - ISO currency for charges (default: usd)
//! - `STRIPE_BASE_URL` - Stripe API root (default: <https://api.stripe.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use storehouse_core::CustomerId;
use storehouse_core::pricing::DEFAULT_TAX_PERCENT;

use crate::views::View;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Customer record that authors carts for anonymous owners
    pub guest_customer_id: CustomerId,
    /// Named views that may be rendered
    pub views: Vec<View>,
    /// Flat tax percentage
    pub tax_percent: u32,
    /// Shipping/fulfillment vendor configuration
    pub shipwire: ShipwireConfig,
    /// Payment vendor configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    /// Local development settings: shipping off, no payment key, the guest
    /// customer seeded by the first migration.
    fn default() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/storehouse".to_string()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            guest_customer_id: CustomerId::new(1),
            views: vec![View::CartSummary, View::CheckoutTotals],
            tax_percent: DEFAULT_TAX_PERCENT,
            shipwire: ShipwireConfig::default(),
            stripe: StripeConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Shipwire XML API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShipwireConfig {
    /// Every vendor call short-circuits when false
    pub enabled: bool,
    pub username: String,
    pub password: SecretString,
    /// `Production` or `Test`
    pub server: String,
    /// Endpoint root, e.g. `https://api.shipwire.com`
    pub base_url: String,
    pub affiliate_id: Option<String>,
}

impl Default for ShipwireConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            password: SecretString::from(String::new()),
            server: "Production".to_string(),
            base_url: "https://api.shipwire.com".to_string(),
            affiliate_id: None,
        }
    }
}

impl std::fmt::Debug for ShipwireConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipwireConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("server", &self.server)
            .field("base_url", &self.base_url)
            .field("affiliate_id", &self.affiliate_id)
            .finish()
    }
}

/// Stripe charges API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    /// ISO currency code for charges
    pub currency: String,
    /// API root, e.g. `https://api.stripe.com`
    pub base_url: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: SecretString::from(String::new()),
            currency: "usd".to_string(),
            base_url: "https://api.stripe.com".to_string(),
        }
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let guest_customer_id = parse_env("STOREFRONT_GUEST_CUSTOMER_ID", "1")?;
        let views = parse_views(&get_env_or_default(
            "STOREFRONT_VIEWS",
            "cart-summary,checkout-totals",
        ))?;
        let tax_percent = parse_env("STOREFRONT_TAX_PERCENT", &DEFAULT_TAX_PERCENT.to_string())?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            guest_customer_id,
            views,
            tax_percent,
            shipwire: ShipwireConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether a named view may be rendered.
    #[must_use]
    pub fn view_enabled(&self, view: View) -> bool {
        self.views.contains(&view)
    }
}

impl ShipwireConfig {
    /// Load the shipping vendor settings alone (used by `sh-cli`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if shipping is enabled without credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled: bool = parse_env("SHIPWIRE_ENABLED", "false")?;
        let defaults = Self::default();
        if !enabled {
            return Ok(defaults);
        }

        Ok(Self {
            enabled,
            username: get_required_env("SHIPWIRE_USERNAME")?,
            password: SecretString::from(get_required_env("SHIPWIRE_PASSWORD")?),
            server: get_env_or_default("SHIPWIRE_SERVER", &defaults.server),
            base_url: get_env_or_default("SHIPWIRE_BASE_URL", &defaults.base_url),
            affiliate_id: get_optional_env("SHIPWIRE_AFFILIATE_ID"),
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            currency: get_env_or_default("STRIPE_CURRENCY", "usd").to_lowercase(),
            base_url: get_env_or_default("STRIPE_BASE_URL", "https://api.stripe.com"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the comma-separated view allow-list.
fn parse_views(value: &str) -> Result<Vec<View>, ConfigError> {
    let mut views = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let view = name.parse::<View>().map_err(|_| {
            ConfigError::InvalidEnvVar("STOREFRONT_VIEWS".to_string(), format!("unknown view '{name}'"))
        })?;
        if !views.contains(&view) {
            views.push(view);
        }
    }
    Ok(views)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
