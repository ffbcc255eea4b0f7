//! Bazaar Core - Shared cart types and pricing.
//!
//! This crate provides the types used across all Bazaar components:
//! - `storefront` - Cart, wishlist and coupon state for the shop front end
//! - `cli` - Command-line front end over the storefront state
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - Line items, cart products and wishlist items
//! - [`coupon`] - Applied coupons and the coupon validation wire format
//! - [`pricing`] - Subtotal, discount, shipping, tax and total
//! - [`order`] - Order drafts produced at checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod coupon;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{CartLineItem, CartProduct, WishlistItem};
pub use coupon::{AppliedCoupon, CouponValidation, CouponValidationRequest, DiscountType};
pub use order::OrderDraft;
pub use pricing::{CartTotals, MAX_SUBTOTAL, PricingError, PricingPolicy, calculate_totals};
pub use types::*;
