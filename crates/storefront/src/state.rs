//! Application state.
//!
//! `AppState` wires the cart, wishlist and coupon session to one key-value
//! store, and holds the coupon validator and pricing policy. Front ends own
//! one `AppState` and pass it where it is needed; nothing here is global.

use bazaar_core::{
    AppliedCoupon, CartLineItem, CartProduct, CartTotals, CurrencyCode, OrderDraft, PricingPolicy,
    ProductId, WishlistItem,
};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::cart::{AddOutcome, CartEvent, CartStore, CartView, QuantityUpdate};
use crate::checkout::prepare_order;
use crate::config::StorefrontConfig;
use crate::coupons::{CouponSession, CouponValidator};
use crate::error::{AppError, Result};
use crate::services::CouponClient;
use crate::storage::{FileStore, KeyValueStore, StorageError};
use crate::wishlist::{WishlistAdd, WishlistStore};

/// Cart, wishlist and coupon state for one shopper.
#[derive(Debug)]
pub struct AppState<S = FileStore, V = CouponClient> {
    cart: CartStore<S>,
    wishlist: WishlistStore<S>,
    coupons: CouponSession<S>,
    validator: V,
    pricing: PricingPolicy,
    currency: CurrencyCode,
}

impl AppState {
    /// Create the application state described by `config`.
    ///
    /// State is persisted as JSON files under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let validator = CouponClient::new(&config.coupons)?;
        let store = FileStore::new(&config.data_dir);
        tracing::debug!(data_dir = %config.data_dir.display(), "Opening storefront state");
        Ok(Self::with_parts(
            store,
            validator,
            config.pricing,
            config.currency,
        ))
    }
}

impl<S, V> AppState<S, V>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    /// Assemble the state from an explicit store and validator.
    pub fn with_parts(store: S, validator: V, pricing: PricingPolicy, currency: CurrencyCode) -> Self {
        Self {
            cart: CartStore::open(store.clone()),
            wishlist: WishlistStore::open(store.clone()),
            coupons: CouponSession::open(store),
            validator,
            pricing,
            currency,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &[WishlistItem] {
        self.wishlist.items()
    }

    #[must_use]
    pub const fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupons.applied()
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Subscribe to cart change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.cart.subscribe()
    }

    /// Totals for the current cart and applied coupon.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the totals overflow.
    pub fn totals(&self) -> Result<CartTotals> {
        Ok(self
            .pricing
            .calculate(self.cart.items(), self.coupons.applied())?)
    }

    /// Display-ready cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the totals overflow.
    pub fn cart_view(&self) -> Result<CartView> {
        let totals = self.totals()?;
        Ok(CartView::new(
            self.cart.items(),
            &totals,
            self.coupons.applied(),
            self.currency,
            self.pricing.amount_to_free_shipping(totals.subtotal),
        ))
    }

    /// Add `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add_to_cart(&mut self, product: CartProduct) -> Result<AddOutcome> {
        Ok(self.cart.add(product)?)
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) -> Result<QuantityUpdate> {
        Ok(self.cart.update_quantity(id, quantity)?)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not in the cart, or a
    /// storage error.
    pub fn remove_from_cart(&mut self, id: ProductId) -> Result<CartLineItem> {
        self.cart
            .remove(id)?
            .ok_or_else(|| AppError::NotFound(format!("product {id} in cart")))
    }

    /// Empty the cart and drop the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if either cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear()?;
        if let Some(coupon) = self.coupons.remove()? {
            tracing::info!(code = %coupon.code, "Coupon dropped with cart");
        }
        Ok(())
    }

    /// Validate `code` against the current subtotal and apply it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Coupon` if the code is blank, refused, or cannot be
    /// checked. The previously applied coupon is kept in every case.
    pub async fn apply_coupon(&mut self, code: &str) -> Result<AppliedCoupon> {
        let subtotal = self.cart.subtotal()?;
        let coupon = self
            .coupons
            .apply(&self.validator, code, subtotal)
            .await?;
        Ok(coupon.clone())
    }

    /// Drop the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    pub fn remove_coupon(&mut self) -> Result<Option<AppliedCoupon>> {
        Ok(self.coupons.remove()?)
    }

    /// Save a product for later.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be persisted.
    pub fn add_to_wishlist(&mut self, item: WishlistItem) -> Result<WishlistAdd> {
        Ok(self.wishlist.add(item)?)
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not saved, or a
    /// storage error.
    pub fn remove_from_wishlist(&mut self, id: ProductId) -> Result<WishlistItem> {
        self.wishlist
            .remove(id)?
            .ok_or_else(|| AppError::NotFound(format!("product {id} in wishlist")))
    }

    /// Empty the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be persisted.
    pub fn clear_wishlist(&mut self) -> Result<()> {
        Ok(self.wishlist.clear()?)
    }

    /// Move a saved product into the cart.
    ///
    /// The product leaves the wishlist even when it is already in the cart.
    /// It stays saved if the cart refuses it or either write fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not saved, or a
    /// storage error.
    #[instrument(skip(self))]
    pub fn move_to_cart(&mut self, id: ProductId) -> Result<AddOutcome> {
        let item = self
            .wishlist
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("product {id} in wishlist")))?;

        let outcome = self.cart.add(CartProduct::from(item))?;
        if outcome == AddOutcome::OverLimit {
            return Ok(outcome);
        }

        if let Err(err) = self.wishlist.remove(id) {
            if outcome == AddOutcome::Added {
                log_failed_rollback("cart", self.cart.remove(id).map(drop));
            }
            return Err(err.into());
        }
        Ok(outcome)
    }

    /// Move a cart line into the wishlist.
    ///
    /// The line stays in the cart if either write fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not in the cart, or a
    /// storage error.
    #[instrument(skip(self))]
    pub fn save_for_later(&mut self, id: ProductId) -> Result<WishlistAdd> {
        let line = self
            .cart
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("product {id} in cart")))?;
        let item = WishlistItem {
            id: line.id,
            name: line.name,
            sku: line.sku,
            slug: line.slug,
            price: line.price,
            image: line.image,
        };

        let outcome = self.wishlist.add(item)?;
        if let Err(err) = self.cart.remove(id) {
            if outcome == WishlistAdd::Added {
                log_failed_rollback("wishlist", self.wishlist.remove(id).map(drop));
            }
            return Err(err.into());
        }
        Ok(outcome)
    }

    /// Prepare an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` if the cart is empty or the coupon fails
    /// re-validation.
    pub async fn checkout(&mut self) -> Result<OrderDraft> {
        Ok(prepare_order(
            &self.cart,
            &mut self.coupons,
            &self.validator,
            &self.pricing,
            self.currency,
        )
        .await?)
    }
}

/// Log a rollback of an interrupted move that could not be persisted.
fn log_failed_rollback(list: &str, result: std::result::Result<(), StorageError>) {
    if let Err(err) = result {
        tracing::error!(list, error = %err, "Failed to roll back interrupted move");
    }
}
