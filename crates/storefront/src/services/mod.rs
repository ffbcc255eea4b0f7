//! Clients for services owned by the REST backend.
//!
//! # Services
//!
//! - `coupons` - Coupon code validation

pub mod coupons;

pub use coupons::CouponClient;
