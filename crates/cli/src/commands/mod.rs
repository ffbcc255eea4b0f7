//! Command implementations.
//!
//! Every command writes its result to the given writer and returns
//! `CliError` on failure; `main` decides how failures are reported.

pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod wishlist;

use std::io::{self, Write};

use bazaar_core::{CartProduct, ProductId, WishlistItem};
use bazaar_storefront::AppError;
use clap::Args;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing to stdout failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    /// Encoding JSON output failed.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Log the failure and tell the shopper what went wrong.
    pub fn report(&self) {
        match self {
            Self::App(err) => {
                err.report();
                let _ = writeln!(io::stderr().lock(), "{}", err.user_message());
            }
            Self::Io(_) | Self::Json(_) => tracing::error!(error = %self, "Command failed"),
        }
    }
}

/// Product fields supplied on the command line.
///
/// The catalogue lives in the backend; callers pass the snapshot to store.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Product ID
    #[arg(long)]
    pub id: ProductId,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Stock keeping unit
    #[arg(long)]
    pub sku: String,

    /// URL slug (derived from the name when omitted)
    #[arg(long)]
    pub slug: Option<String>,

    /// Unit price
    #[arg(long)]
    pub price: Decimal,

    /// Image URL
    #[arg(long)]
    pub image: Option<String>,
}

impl ProductArgs {
    /// Convert into the product snapshot stored in the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a negative price or a blank name.
    pub fn into_product(self) -> Result<CartProduct, AppError> {
        if self.price.is_sign_negative() {
            return Err(AppError::BadRequest("Price must not be negative.".to_string()));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Product name is required.".to_string()));
        }

        let slug = self.slug.unwrap_or_else(|| slugify(&name));
        Ok(CartProduct {
            id: self.id,
            name,
            sku: self.sku,
            slug,
            price: self.price,
            image: self.image,
        })
    }

    /// Convert into a wishlist entry.
    ///
    /// # Errors
    ///
    /// See [`ProductArgs::into_product`].
    pub fn into_wishlist_item(self) -> Result<WishlistItem, AppError> {
        self.into_product().map(WishlistItem::from)
    }
}

/// Lower-case `name`, joining runs of alphanumerics with single dashes.
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::args;
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Cold Brew Kit"), "cold-brew-kit");
        assert_eq!(slugify("  Mug (12 oz) -- Blue "), "mug-12-oz-blue");
    }

    #[test]
    fn test_into_product() {
        let product = args(7, " Cold Brew Kit ", 500).into_product().unwrap();
        assert_eq!(product.name, "Cold Brew Kit");
        assert_eq!(product.slug, "cold-brew-kit");
        assert_eq!(product.price, Decimal::new(500, 0));
    }

    #[test]
    fn test_into_product_rejects_bad_input() {
        let mut negative = args(1, "Mug", 0);
        negative.price = Decimal::new(-1, 0);
        assert!(matches!(negative.into_product(), Err(AppError::BadRequest(_))));

        assert!(matches!(
            args(1, "   ", 10).into_product(),
            Err(AppError::BadRequest(_))
        ));
    }
}
