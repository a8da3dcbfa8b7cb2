//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARIGOLD_API_BASE_URL` - Base URL of the storefront API
//! - `MARIGOLD_VAULT_SECRET` - Session vault secret (min 32 chars)
//!
//! ## Optional
//! - `MARIGOLD_SHIPPING_BASE_RATE` - Default per-line base rate (default: 5.00)
//! - `MARIGOLD_SHIPPING_ADDITIONAL_RATE` - Default per-unit rate (default: 0)
//! - `MARIGOLD_FREE_SHIPPING_THRESHOLD` - Free shipping subtotal, 0 disables (default: 0)
//! - `MARIGOLD_HANDLING_FEE` - Per-shipment handling fee (default: 0)

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::shipping::ShippingConfig;

const MIN_VAULT_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "insert",
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

/// Checkout core configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the storefront API.
    pub api_base_url: Url,
    /// Secret the session vault derives its key from.
    pub vault_secret: SecretString,
    /// Store-wide shipping rates.
    pub shipping: ShippingConfig,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the vault secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("MARIGOLD_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MARIGOLD_API_BASE_URL".to_owned(), e.to_string())
            })?;

        let vault_secret = SecretString::from(get_required_env("MARIGOLD_VAULT_SECRET")?);
        validate_vault_secret(&vault_secret, "MARIGOLD_VAULT_SECRET")?;

        let shipping = ShippingConfig {
            base_rate: get_decimal_env("MARIGOLD_SHIPPING_BASE_RATE", "5.00")?,
            additional_item_rate: get_decimal_env("MARIGOLD_SHIPPING_ADDITIONAL_RATE", "0")?,
            product_overrides: std::collections::HashMap::new(),
            free_shipping_threshold: get_decimal_env("MARIGOLD_FREE_SHIPPING_THRESHOLD", "0")?,
            handling_fee: get_decimal_env("MARIGOLD_HANDLING_FEE", "0")?,
        };

        Ok(Self {
            api_base_url,
            vault_secret,
            shipping,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse a decimal environment variable with a default.
fn get_decimal_env(key: &str, default: &str) -> Result<Decimal, ConfigError> {
    get_env_or_default(key, default)
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Validate that the vault secret is long enough and not a placeholder.
fn validate_vault_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();

    if value.len() < MIN_VAULT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_VAULT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
