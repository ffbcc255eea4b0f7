//! Display-ready projection of the cart and its totals.

use std::fmt;

use bazaar_core::{AppliedCoupon, CartLineItem, CartTotals, CurrencyCode, Price};
use rust_decimal::Decimal;

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub coupon: Option<String>,
    pub subtotal: String,
    pub discount: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
    /// Set when the cart is below the free-shipping threshold.
    pub free_shipping_hint: Option<String>,
}

impl CartView {
    /// Build the view for `items` with precomputed `totals`.
    #[must_use]
    pub fn new(
        items: &[CartLineItem],
        totals: &CartTotals,
        coupon: Option<&AppliedCoupon>,
        currency: CurrencyCode,
        amount_to_free_shipping: Decimal,
    ) -> Self {
        let money = |amount: Decimal| Price::new(amount, currency).display();

        Self {
            items: items
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            item_count: items.iter().map(|item| u64::from(item.quantity)).sum(),
            coupon: coupon.map(AppliedCoupon::label),
            subtotal: money(totals.subtotal),
            discount: money(-totals.discount),
            shipping: if totals.shipping.is_zero() {
                "Free".to_string()
            } else {
                money(totals.shipping)
            },
            tax: money(totals.tax),
            total: money(totals.total),
            free_shipping_hint: (!items.is_empty() && amount_to_free_shipping > Decimal::ZERO)
                .then(|| format!("Add {} more for free shipping", money(amount_to_free_shipping))),
        }
    }
}

impl CartItemView {
    fn new(item: &CartLineItem, currency: CurrencyCode) -> Self {
        Self {
            id: item.id.to_string(),
            slug: item.slug.clone(),
            name: item.name.clone(),
            sku: item.sku.clone(),
            quantity: item.quantity,
            price: Price::new(item.price, currency).display(),
            line_price: item
                .line_total()
                .map_or_else(String::new, |total| Price::new(total, currency).display()),
            image: item.image.clone(),
        }
    }
}

impl fmt::Display for CartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            writeln!(f, "Your cart is empty.")?;
        } else {
            for item in &self.items {
                writeln!(
                    f,
                    "{:>6}  {:<32} {:>4} x {:>12} = {:>12}",
                    item.id, item.name, item.quantity, item.price, item.line_price
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Items:    {}", self.item_count)?;
        writeln!(f, "Subtotal: {}", self.subtotal)?;
        if let Some(coupon) = &self.coupon {
            writeln!(f, "Discount: {} [{coupon}]", self.discount)?;
        }
        writeln!(f, "Shipping: {}", self.shipping)?;
        writeln!(f, "Tax:      {}", self.tax)?;
        write!(f, "Total:    {}", self.total)?;
        if let Some(hint) = &self.free_shipping_hint {
            write!(f, "\n{hint}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::{DiscountType, PricingPolicy, ProductId};

    fn items() -> Vec<CartLineItem> {
        vec![CartLineItem {
            id: ProductId::new(1),
            name: "Cold Brew Kit".to_string(),
            sku: "CB-1".to_string(),
            slug: "cold-brew-kit".to_string(),
            price: Decimal::new(500, 0),
            quantity: 2,
            image: Some("https://cdn.example.com/cb.png".to_string()),
        }]
    }

    #[test]
    fn test_view_formats_totals() {
        let coupon = AppliedCoupon {
            code: "SAVE10".to_string(),
            discount: Decimal::new(100, 0),
            discount_type: DiscountType::Percentage,
            value: Decimal::new(10, 0),
            description: None,
        };
        let policy = PricingPolicy::default();
        let totals = policy.calculate(&items(), Some(&coupon)).unwrap();
        let view = CartView::new(
            &items(),
            &totals,
            Some(&coupon),
            CurrencyCode::INR,
            policy.amount_to_free_shipping(totals.subtotal),
        );

        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "₹1000.00");
        assert_eq!(view.discount, "-₹100.00");
        assert_eq!(view.shipping, "Free");
        assert_eq!(view.tax, "₹162.00");
        assert_eq!(view.total, "₹1062.00");
        assert_eq!(view.coupon.as_deref(), Some("SAVE10 (10% off)"));
        assert!(view.free_shipping_hint.is_none());

        let item = view.items.first().map(|i| i.line_price.as_str());
        assert_eq!(item, Some("₹1000.00"));
    }

    #[test]
    fn test_view_hints_free_shipping() {
        let mut cart = items();
        if let Some(item) = cart.first_mut() {
            item.quantity = 1;
        }
        let policy = PricingPolicy::default();
        let totals = policy.calculate(&cart, None).unwrap();
        let view = CartView::new(
            &cart,
            &totals,
            None,
            CurrencyCode::INR,
            policy.amount_to_free_shipping(totals.subtotal),
        );

        assert_eq!(view.shipping, "₹99.00");
        assert_eq!(
            view.free_shipping_hint.as_deref(),
            Some("Add ₹499.00 more for free shipping")
        );
        assert!(view.to_string().contains("Add ₹499.00 more"));
    }

    #[test]
    fn test_empty_view() {
        let policy = PricingPolicy::default();
        let totals = policy.calculate(&[], None).unwrap();
        let view = CartView::new(&[], &totals, None, CurrencyCode::INR, Decimal::new(999, 0));

        assert!(view.items.is_empty());
        assert!(view.free_shipping_hint.is_none());
        assert_eq!(view.total, "₹99.00");
        assert!(view.to_string().starts_with("Your cart is empty."));
    }
}
