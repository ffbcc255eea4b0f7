//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before the front end shows the shopper a message. All `AppState`
//! operations return `Result<T, AppError>`.

use bazaar_core::PricingError;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::coupons::CouponError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Coupon could not be applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Order could not be prepared.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from the shopper.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl AppError {
    /// Whether this error points at a fault on our side rather than at the
    /// shopper's input.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => true,
            Self::Coupon(err) => !err.is_rejection() && !matches!(err, CouponError::EmptyCode),
            Self::Checkout(err) => err.is_server_error(),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show the shopper.
    ///
    /// Internal details never leak.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
            Self::Storage(_) => "Could not save your cart. Please try again.".to_string(),
            Self::Coupon(err) => err.user_message().to_string(),
            Self::Checkout(err) => err.user_message().to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Log the error, capturing server-class errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::info!(error = %self, "Operation refused");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
