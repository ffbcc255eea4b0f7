//! Coupon types and the wire format of the coupon validation endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shape of the discount a coupon grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the cart total.
    Percentage,
    /// `value` is an absolute currency amount.
    #[default]
    Fixed,
}

/// A coupon the backend accepted for the current cart.
///
/// `discount` is the absolute amount computed server-side; `discount_type`
/// and `value` are kept only to describe the coupon to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    pub value: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

impl AppliedCoupon {
    /// Short human-readable label, e.g. `SAVE10 (10% off)`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.discount_type {
            DiscountType::Percentage => {
                format!("{} ({}% off)", self.code, self.value.normalize())
            }
            DiscountType::Fixed => format!("{} ({} off)", self.code, self.value.normalize()),
        }
    }
}

/// Request body for `POST /coupons/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponValidationRequest {
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cart_total: Decimal,
}

/// Response body of `POST /coupons/validate`.
///
/// Rejections may omit every field but `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CouponValidation {
    /// Convert an accepted validation into an [`AppliedCoupon`].
    ///
    /// `submitted_code` is used when the backend does not echo the code.
    /// Returns `None` when the response is not valid.
    #[must_use]
    pub fn into_applied(self, submitted_code: &str) -> Option<AppliedCoupon> {
        if !self.valid {
            return None;
        }

        let discount = self.discount_amount.unwrap_or(Decimal::ZERO);
        Some(AppliedCoupon {
            code: self.code.unwrap_or_else(|| submitted_code.to_string()),
            discount,
            discount_type: self.discount_type.unwrap_or_default(),
            value: self.discount_value.unwrap_or(discount),
            description: self.description,
        })
    }
}
