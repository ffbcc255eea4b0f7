//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for identifiers and money.

pub mod id;
pub mod price;

pub use id::*;
pub use price::{CurrencyCode, Price, UnknownCurrency};
