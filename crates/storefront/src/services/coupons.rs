//! Coupon validation API client.
//!
//! Posts `{code, cart_total}` to the backend's `coupons/validate` endpoint.
//! Accepted validations are cached briefly with `moka` so re-rendering a
//! cart does not hit the backend every time; checkout bypasses the cache.

use std::sync::Arc;
use std::time::Duration;

use bazaar_core::{CouponValidation, CouponValidationRequest};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::CouponServiceConfig;
use crate::coupons::{CouponError, CouponValidator};

/// Path of the validation endpoint relative to the API base URL.
const VALIDATE_PATH: &str = "coupons/validate";

/// How long an accepted validation is reused.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Longest body excerpt carried in an [`CouponError::Api`].
const MAX_ERROR_BODY: usize = 200;

/// Cache key: upper-cased code and normalized cart total.
type CacheKey = (String, String);

/// Client for the backend coupon validation endpoint.
#[derive(Clone)]
pub struct CouponClient {
    inner: Arc<CouponClientInner>,
}

struct CouponClientInner {
    client: reqwest::Client,
    endpoint: String,
    cache: Cache<CacheKey, CouponValidation>,
}

impl CouponClient {
    /// Create a new coupon API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CouponServiceConfig) -> Result<Self, CouponError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| CouponError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let endpoint = format!(
            "{}/{VALIDATE_PATH}",
            config.base_url.as_str().trim_end_matches('/')
        );

        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CouponClientInner {
                client,
                endpoint,
                cache,
            }),
        })
    }

    /// Full URL of the validation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Send one validation request.
    async fn request(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponValidation, CouponError> {
        let body = CouponValidationRequest {
            code: code.to_string(),
            cart_total,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(MAX_ERROR_BODY).collect::<String>(),
                    "Failed to parse coupon validation response"
                );
                CouponError::Parse(e.to_string())
            });
        }

        // Some backends answer a refused code with 4xx and a `valid: false` body
        if status.is_client_error()
            && let Ok(validation) = serde_json::from_str::<CouponValidation>(&text)
            && !validation.valid
        {
            return Ok(validation);
        }

        tracing::error!(
            status = %status,
            body = %text.chars().take(MAX_ERROR_BODY).collect::<String>(),
            "Coupon API returned non-success status"
        );
        Err(CouponError::Api {
            status: status.as_u16(),
            message: text.chars().take(MAX_ERROR_BODY).collect(),
        })
    }
}

fn cache_key(code: &str, cart_total: Decimal) -> CacheKey {
    (
        code.to_ascii_uppercase(),
        cart_total.normalize().to_string(),
    )
}

impl CouponValidator for CouponClient {
    #[instrument(skip(self))]
    async fn validate(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponValidation, CouponError> {
        let key = cache_key(code, cart_total);
        if let Some(cached) = self.inner.cache.get(&key).await {
            tracing::debug!("Coupon validation cache hit");
            return Ok(cached);
        }

        let validation = self.request(code, cart_total).await?;
        if validation.valid {
            self.inner.cache.insert(key, validation.clone()).await;
        }
        Ok(validation)
    }

    #[instrument(skip(self))]
    async fn validate_fresh(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponValidation, CouponError> {
        let key = cache_key(code, cart_total);
        self.inner.cache.invalidate(&key).await;

        let validation = self.request(code, cart_total).await?;
        if validation.valid {
            self.inner.cache.insert(key, validation.clone()).await;
        }
        Ok(validation)
    }
}
