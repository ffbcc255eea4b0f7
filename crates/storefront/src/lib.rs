//! Bazaar storefront library.
//!
//! Client-side cart layer of a storefront whose catalogue, coupons and orders
//! live in a REST backend. Keeps the cart, applied coupon and wishlist in a
//! local key-value store, derives totals, and validates coupon codes
//! remotely.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod wishlist;

pub use error::{AppError, Result};
pub use state::AppState;
