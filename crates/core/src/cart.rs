//! Cart line items and the product snapshots they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A product as offered to the cart: everything a line item needs except
/// the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub slug: String,
    /// Unit price at the moment the shopper adds the product.
    pub price: Decimal,
    pub image: Option<String>,
}

/// One distinct product entry in the cart.
///
/// `price` is a snapshot taken when the product was added and is not kept
/// in sync with later catalogue changes. `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub slug: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartLineItem {
    /// Price of the whole line (`price × quantity`), or `None` if the
    /// product does not fit in a `Decimal`.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<CartProduct> for CartLineItem {
    fn from(product: CartProduct) -> Self {
        Self {
            id: product.id,
            name: product.name,
            sku: product.sku,
            slug: product.slug,
            price: product.price,
            quantity: 1,
            image: product.image,
        }
    }
}

/// A product saved for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<CartProduct> for WishlistItem {
    fn from(product: CartProduct) -> Self {
        Self {
            id: product.id,
            name: product.name,
            sku: product.sku,
            slug: product.slug,
            price: product.price,
            image: product.image,
        }
    }
}

impl From<WishlistItem> for CartProduct {
    fn from(item: WishlistItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            sku: item.sku,
            slug: item.slug,
            price: item.price,
            image: item.image,
        }
    }
}
