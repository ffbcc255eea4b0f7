//! Coupon application.
//!
//! Coupons are validated remotely; the storefront only keeps the accepted
//! result. [`CouponSession`] owns the applied coupon and persists it next to
//! the cart so it survives restarts. A failed apply never touches the coupon
//! already held.

use std::future::Future;

use bazaar_core::{AppliedCoupon, CouponValidation};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::models::storage_keys;
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

/// Message shown for every remote coupon failure.
const COUPON_FAILED_MESSAGE: &str = "This coupon code is invalid or has expired.";

/// Errors that can occur when applying a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Submission blocked: the code was empty after trimming.
    #[error("Coupon code is empty")]
    EmptyCode,

    /// The service answered `valid = false`.
    #[error("Coupon {code} rejected: {}", reason.as_deref().unwrap_or("no reason given"))]
    Rejected {
        code: String,
        reason: Option<String>,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Accepted coupon could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CouponError {
    /// Message safe to show the shopper.
    ///
    /// Invalid, expired, below-minimum and service failures are deliberately
    /// indistinguishable.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyCode => "Please enter a coupon code.",
            Self::Storage(_) => "Could not save your coupon. Please try again.",
            Self::Rejected { .. } | Self::Http(_) | Self::Api { .. } | Self::Parse(_) => {
                COUPON_FAILED_MESSAGE
            }
        }
    }

    /// Whether the service positively refused the code, as opposed to the
    /// request failing.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Remote coupon validation.
pub trait CouponValidator {
    /// Validate `code` against a cart worth `cart_total`.
    ///
    /// Implementations may answer from a short-lived cache.
    fn validate(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> impl Future<Output = Result<CouponValidation, CouponError>> + Send;

    /// Like [`validate`](Self::validate) but always asks the service.
    fn validate_fresh(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> impl Future<Output = Result<CouponValidation, CouponError>> + Send {
        self.validate(code, cart_total)
    }
}

/// The coupon applied to the cart, if any.
#[derive(Debug)]
pub struct CouponSession<S> {
    store: S,
    applied: Option<AppliedCoupon>,
}

impl<S: KeyValueStore> CouponSession<S> {
    /// Open the coupon state persisted in `store`.
    pub fn open(store: S) -> Self {
        let applied = load_json(&store, storage_keys::APPLIED_COUPON);
        Self { store, applied }
    }

    /// Currently applied coupon.
    #[must_use]
    pub const fn applied(&self) -> Option<&AppliedCoupon> {
        self.applied.as_ref()
    }

    /// Validate `code` for a cart worth `cart_total` and apply it.
    ///
    /// # Errors
    ///
    /// - `CouponError::EmptyCode` if `code` is blank; no request is made
    /// - `CouponError::Rejected` if the service refuses the code
    /// - transport, API and parse errors from the validator
    /// - `CouponError::Storage` if the accepted coupon cannot be persisted
    ///
    /// On every error the previously applied coupon is left as it was.
    #[instrument(skip(self, validator))]
    pub async fn apply<V: CouponValidator>(
        &mut self,
        validator: &V,
        code: &str,
        cart_total: Decimal,
    ) -> Result<&AppliedCoupon, CouponError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CouponError::EmptyCode);
        }

        let validation = validator.validate(code, cart_total).await.map_err(|e| {
            tracing::warn!(error = %e, "Coupon validation failed");
            e
        })?;

        let reason = validation.description.clone();
        let Some(coupon) = validation.into_applied(code) else {
            tracing::info!(?reason, "Coupon rejected");
            return Err(CouponError::Rejected {
                code: code.to_string(),
                reason,
            });
        };

        save_json(&self.store, storage_keys::APPLIED_COUPON, &coupon)?;
        tracing::info!(discount = %coupon.discount, "Coupon applied");
        add_breadcrumb("coupon", "Applied coupon", Some(&[("code", coupon.code.as_str())]));

        Ok(&*self.applied.insert(coupon))
    }

    /// Drop the applied coupon, returning it if there was one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal cannot be persisted.
    pub fn remove(&mut self) -> Result<Option<AppliedCoupon>, StorageError> {
        self.store.remove(storage_keys::APPLIED_COUPON)?;
        Ok(self.applied.take())
    }

    /// Ask the service again whether the held coupon applies to a cart worth
    /// `cart_total`, bypassing any cache.
    ///
    /// Returns `Ok(None)` when no coupon is held. An accepted coupon is
    /// refreshed with the newly computed discount.
    ///
    /// # Errors
    ///
    /// - `CouponError::Rejected` if the service now refuses the code; the
    ///   coupon is removed
    /// - transport, API and parse errors; the coupon is kept
    #[instrument(skip(self, validator))]
    pub async fn revalidate<V: CouponValidator>(
        &mut self,
        validator: &V,
        cart_total: Decimal,
    ) -> Result<Option<&AppliedCoupon>, CouponError> {
        let Some(code) = self.applied.as_ref().map(|c| c.code.clone()) else {
            return Ok(None);
        };

        let validation = validator.validate_fresh(&code, cart_total).await?;
        let reason = validation.description.clone();

        match validation.into_applied(&code) {
            Some(coupon) => {
                if self.applied.as_ref() != Some(&coupon) {
                    save_json(&self.store, storage_keys::APPLIED_COUPON, &coupon)?;
                    tracing::info!(discount = %coupon.discount, "Coupon discount refreshed");
                }
                Ok(Some(&*self.applied.insert(coupon)))
            }
            None => {
                tracing::info!(?reason, "Applied coupon no longer valid");
                self.remove()?;
                Err(CouponError::Rejected { code, reason })
            }
        }
    }
}
