//! Checkout preparation.
//!
//! Turns the current cart into an [`OrderDraft`]. The applied coupon is
//! re-validated against the current subtotal first, so a discount computed
//! for an earlier cart never reaches an order.

use bazaar_core::{CurrencyCode, OrderDraft, OrderDraftId, PricingError, PricingPolicy};
use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use crate::cart::CartStore;
use crate::coupons::{CouponError, CouponSession, CouponValidator};
use crate::error::add_breadcrumb;
use crate::storage::{KeyValueStore, StorageError};

/// Errors that can occur when preparing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// The held coupon no longer applies and was removed.
    #[error("Coupon {code} no longer applies: {}", reason.as_deref().unwrap_or("no reason given"))]
    CouponRemoved {
        code: String,
        reason: Option<String>,
    },

    /// The coupon service could not be reached; the coupon is kept.
    #[error("Coupon check failed: {0}")]
    CouponCheck(CouponError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
}

impl From<CouponError> for CheckoutError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::Rejected { code, reason } => Self::CouponRemoved { code, reason },
            CouponError::Storage(err) => Self::Storage(err),
            other => Self::CouponCheck(other),
        }
    }
}

impl CheckoutError {
    /// Message safe to show the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyCart => "Your cart is empty.",
            Self::CouponRemoved { .. } => {
                "Your coupon no longer applies and has been removed. Please review your updated total."
            }
            Self::CouponCheck(_) => "We could not verify your coupon. Please try again.",
            Self::Storage(_) => "Could not save your cart. Please try again.",
            Self::Pricing(_) => "Something went wrong. Please try again.",
        }
    }

    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::CouponCheck(_) | Self::Storage(_) | Self::Pricing(_))
    }
}

/// Snapshot the cart into an order draft.
///
/// # Errors
///
/// - `CheckoutError::EmptyCart` if there is nothing to order
/// - `CheckoutError::CouponRemoved` if the coupon was refused on re-validation
/// - `CheckoutError::CouponCheck` if the coupon service failed
/// - `CheckoutError::Pricing` if the totals overflow
#[instrument(skip_all, fields(items = cart.items().len()))]
pub async fn prepare_order<S, C, V>(
    cart: &CartStore<S>,
    coupons: &mut CouponSession<C>,
    validator: &V,
    policy: &PricingPolicy,
    currency: CurrencyCode,
) -> Result<OrderDraft, CheckoutError>
where
    S: KeyValueStore,
    C: KeyValueStore,
    V: CouponValidator,
{
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let subtotal = cart.subtotal()?;
    let coupon = coupons.revalidate(validator, subtotal).await?;
    let totals = policy.calculate(cart.items(), coupon)?;

    let draft = OrderDraft {
        id: OrderDraftId::generate(),
        created_at: Utc::now(),
        currency,
        items: cart.items().to_vec(),
        coupon_code: coupon.map(|c| c.code.clone()),
        totals,
    };

    tracing::info!(
        order_draft_id = %draft.id,
        total = %draft.totals.total,
        "Order draft prepared"
    );
    let draft_id = draft.id.to_string();
    add_breadcrumb("checkout", "Prepared order", Some(&[("order_draft_id", draft_id.as_str())]));

    Ok(draft)
}
