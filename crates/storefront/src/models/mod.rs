//! Shared storefront model constants.

/// Storage keys for persisted client-side state.
pub mod storage_keys {
    /// Key for the cart line items.
    pub const CART: &str = "cart";

    /// Key for the coupon currently applied to the cart.
    pub const APPLIED_COUPON: &str = "applied_coupon";

    /// Key for the saved-for-later product list.
    pub const WISHLIST: &str = "wishlist";
}
