//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_BASE_URL` - Base URL of the REST backend
//!
//! ## Optional
//! - `BAZAAR_API_TOKEN` - Bearer token for the backend
//! - `BAZAAR_DATA_DIR` - Directory for persisted cart state (default: .bazaar)
//! - `BAZAAR_CURRENCY` - ISO 4217 display currency (default: INR)
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `BAZAAR_FREE_SHIPPING_THRESHOLD` - Free shipping from this subtotal (default: 999)
//! - `BAZAAR_SHIPPING_FEE` - Shipping below the threshold (default: 99)
//! - `BAZAAR_TAX_RATE` - Tax as a fraction (default: 0.18)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bazaar_core::{CurrencyCode, PricingPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
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

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory holding the persisted cart, coupon and wishlist
    pub data_dir: PathBuf,
    /// Currency used to display amounts
    pub currency: CurrencyCode,
    /// Shipping threshold, shipping fee and tax rate
    pub pricing: PricingPolicy,
    /// Coupon validation endpoint configuration
    pub coupons: CouponServiceConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Backend coupon service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CouponServiceConfig {
    /// Base URL of the REST backend
    pub base_url: Url,
    /// Bearer token sent with every request
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for CouponServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
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
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup: &lookup };
        let defaults = PricingPolicy::default();

        let pricing = PricingPolicy {
            free_shipping_threshold: env.parse_or(
                "BAZAAR_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            shipping_fee: env.parse_or("BAZAAR_SHIPPING_FEE", defaults.shipping_fee)?,
            tax_rate: env.parse_or("BAZAAR_TAX_RATE", defaults.tax_rate)?,
        };
        validate_pricing(&pricing)?;

        Ok(Self {
            data_dir: env
                .optional("BAZAAR_DATA_DIR")
                .map_or_else(|| PathBuf::from(".bazaar"), PathBuf::from),
            currency: env.parse_or("BAZAAR_CURRENCY", CurrencyCode::default())?,
            pricing,
            coupons: CouponServiceConfig::from_env(&env)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

impl CouponServiceConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw_url = env.required("BAZAAR_API_BASE_URL")?;
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BAZAAR_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let api_token = match env.optional("BAZAAR_API_TOKEN") {
            Some(token) => {
                validate_secret_strength(&token, "BAZAAR_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        let timeout_secs: u64 = env.parse_or("BAZAAR_HTTP_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the loaders.
struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Reject negative amounts and tax rates outside `[0, 1]`.
fn validate_pricing(pricing: &PricingPolicy) -> Result<(), ConfigError> {
    if pricing.free_shipping_threshold.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_FREE_SHIPPING_THRESHOLD".to_string(),
            "must not be negative".to_string(),
        ));
    }
    if pricing.shipping_fee.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_SHIPPING_FEE".to_string(),
            "must not be negative".to_string(),
        ));
    }
    if pricing.tax_rate.is_sign_negative() || pricing.tax_rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_TAX_RATE".to_string(),
            "must be a fraction between 0 and 1".to_string(),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}
