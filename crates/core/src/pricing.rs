//! Cart totals.
//!
//! Totals are never stored: they are derived from the line items and the
//! applied coupon every time they are needed.
//!
//! ```text
//! subtotal = Σ(price × quantity)
//! discount = clamp(coupon.discount, 0, subtotal)
//! shipping = 0 if subtotal ≥ free_shipping_threshold else shipping_fee
//! tax      = (subtotal − discount) × tax_rate
//! total    = subtotal − discount + shipping + tax
//! ```
//!
//! All arithmetic is checked. Carts are expected to stay below
//! [`MAX_SUBTOTAL`]; anything larger than a `Decimal` can hold is reported as
//! [`PricingError::Overflow`] instead of panicking.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLineItem;
use crate::coupon::AppliedCoupon;

/// Largest subtotal a cart may hold (10^15 currency units).
pub const MAX_SUBTOTAL: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Errors from totals arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("cart amount overflowed")]
    Overflow,
}

/// Free-shipping threshold, flat shipping fee and tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Subtotals at or above this amount ship for free.
    pub free_shipping_threshold: Decimal,
    /// Shipping charged below the threshold.
    pub shipping_fee: Decimal,
    /// Fraction of the discounted subtotal charged as tax (0.18 = 18%).
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(999, 0),
            shipping_fee: Decimal::new(99, 0),
            tax_rate: Decimal::new(18, 2),
        }
    }
}

/// Totals derived from a cart and its coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PricingPolicy {
    /// Compute the totals for `items` with an optional coupon.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Overflow` if any amount does not fit in a
    /// `Decimal`.
    pub fn calculate(
        &self,
        items: &[CartLineItem],
        coupon: Option<&AppliedCoupon>,
    ) -> Result<CartTotals, PricingError> {
        let subtotal = subtotal(items)?;
        let discount = coupon
            .map_or(Decimal::ZERO, |c| c.discount)
            .max(Decimal::ZERO)
            .min(subtotal.max(Decimal::ZERO));
        let taxable = subtotal
            .checked_sub(discount)
            .ok_or(PricingError::Overflow)?;
        let shipping = self.shipping_for(subtotal);
        let tax = taxable
            .checked_mul(self.tax_rate)
            .ok_or(PricingError::Overflow)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let total = taxable
            .checked_add(shipping)
            .and_then(|amount| amount.checked_add(tax))
            .ok_or(PricingError::Overflow)?;

        Ok(CartTotals {
            subtotal,
            discount,
            shipping,
            tax,
            total,
        })
    }

    /// Shipping fee for a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// How much more the shopper must add to qualify for free shipping.
    #[must_use]
    pub fn amount_to_free_shipping(&self, subtotal: Decimal) -> Decimal {
        self.free_shipping_threshold
            .checked_sub(subtotal)
            .map_or(Decimal::ZERO, |remaining| remaining.max(Decimal::ZERO))
    }
}

/// Sum of `price × quantity` over all line items.
///
/// # Errors
///
/// Returns `PricingError::Overflow` if a line or the sum does not fit in a
/// `Decimal`.
pub fn subtotal(items: &[CartLineItem]) -> Result<Decimal, PricingError> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        item.line_total()
            .and_then(|line| sum.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}

/// Whether `items` form a cart the pricing rules accept: no negative
/// prices and a subtotal no larger than [`MAX_SUBTOTAL`].
#[must_use]
pub fn within_limits(items: &[CartLineItem]) -> bool {
    items.iter().all(|item| !item.price.is_sign_negative())
        && subtotal(items).is_ok_and(|sum| sum <= MAX_SUBTOTAL)
}

/// Compute totals with the default [`PricingPolicy`].
///
/// # Errors
///
/// Returns `PricingError::Overflow` if any amount does not fit in a
/// `Decimal`.
pub fn calculate_totals(
    items: &[CartLineItem],
    coupon: Option<&AppliedCoupon>,
) -> Result<CartTotals, PricingError> {
    PricingPolicy::default().calculate(items, coupon)
}
