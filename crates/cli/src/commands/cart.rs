//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar cart show
//! bazaar cart add --id 42 --name "Cold Brew Kit" --sku CB-1 --price 500
//! bazaar cart update 42 3
//! bazaar cart remove 42
//! bazaar cart save 42
//! bazaar cart clear
//! ```

use std::io::Write;

use bazaar_core::ProductId;
use bazaar_storefront::AppState;
use bazaar_storefront::cart::{AddOutcome, QuantityUpdate};
use bazaar_storefront::coupons::CouponValidator;
use bazaar_storefront::storage::KeyValueStore;
use bazaar_storefront::wishlist::WishlistAdd;

use super::{CliError, ProductArgs};

/// Print line items and totals.
pub fn show<S, V>(state: &AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    writeln!(out, "{}", state.cart_view()?)?;
    Ok(())
}

/// Add a product to the cart.
pub fn add<S, V>(
    state: &mut AppState<S, V>,
    product: ProductArgs,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let product = product.into_product()?;
    let name = product.name.clone();

    match state.add_to_cart(product)? {
        AddOutcome::Added => writeln!(out, "Added {name} to your cart.")?,
        AddOutcome::AlreadyInCart => writeln!(out, "{name} is already in your cart.")?,
        AddOutcome::OverLimit => {
            writeln!(out, "{name} would take your cart over its limit; cart unchanged.")?;
        }
    }
    write_badge(state, out)
}

/// Set the quantity of a line item.
pub fn update<S, V>(
    state: &mut AppState<S, V>,
    id: ProductId,
    quantity: i64,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    match state.update_quantity(id, quantity)? {
        QuantityUpdate::Updated => writeln!(out, "Quantity of product {id} set to {quantity}.")?,
        QuantityUpdate::Ignored => {
            writeln!(out, "Quantity must be at least 1; cart unchanged.")?;
        }
        QuantityUpdate::NotInCart => writeln!(out, "Product {id} is not in your cart.")?,
        QuantityUpdate::OverLimit => {
            writeln!(out, "That quantity would take your cart over its limit; cart unchanged.")?;
        }
    }
    write_badge(state, out)
}

/// Remove a line item.
pub fn remove<S, V>(
    state: &mut AppState<S, V>,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let removed = state.remove_from_cart(id)?;
    writeln!(out, "Removed {} from your cart.", removed.name)?;
    write_badge(state, out)
}

/// Move a line item to the wishlist.
pub fn save_for_later<S, V>(
    state: &mut AppState<S, V>,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    match state.save_for_later(id)? {
        WishlistAdd::Added => writeln!(out, "Saved product {id} for later.")?,
        WishlistAdd::AlreadySaved => {
            writeln!(out, "Product {id} was already saved; removed it from your cart.")?;
        }
    }
    write_badge(state, out)
}

/// Empty the cart.
pub fn clear<S, V>(state: &mut AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    state.clear_cart()?;
    writeln!(out, "Your cart is now empty.")?;
    Ok(())
}

fn write_badge<S, V>(state: &AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let count = state.cart().item_count();
    let noun = if count == 1 { "item" } else { "items" };
    writeln!(out, "Cart: {count} {noun}, subtotal {}", state.cart_view()?.subtotal)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::super::test_support::{args, output, state};
    use super::*;

    #[test]
    fn test_add_and_show() {
        let mut app = state();
        let mut buf = Vec::new();
        add(&mut app, args(1, "Cold Brew Kit", 500), &mut buf).unwrap();
        add(&mut app, args(1, "Cold Brew Kit", 500), &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Added Cold Brew Kit to your cart."));
        assert!(text.contains("Cold Brew Kit is already in your cart."));
        assert!(text.contains("Cart: 1 item, subtotal ₹500.00"));

        let mut buf = Vec::new();
        show(&app, &mut buf).unwrap();
        let text = output(buf);
        assert!(text.contains("Cold Brew Kit"));
        assert!(text.contains("Total:    ₹689.00"));
        assert!(text.contains("Add ₹499.00 more for free shipping"));
    }

    #[test]
    fn test_update_reports_outcome() {
        let mut app = state();
        let mut buf = Vec::new();
        add(&mut app, args(1, "Mug", 250), &mut buf).unwrap();
        update(&mut app, ProductId::new(1), 4, &mut buf).unwrap();
        update(&mut app, ProductId::new(1), 0, &mut buf).unwrap();
        update(&mut app, ProductId::new(2), 3, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Quantity of product 1 set to 4."));
        assert!(text.contains("Quantity must be at least 1; cart unchanged."));
        assert!(text.contains("Product 2 is not in your cart."));
        assert_eq!(app.cart().item_count(), 4);
    }

    #[test]
    fn test_remove_missing_fails() {
        let mut app = state();
        let mut buf = Vec::new();
        let err = remove(&mut app, ProductId::new(3), &mut buf).unwrap_err();
        assert!(matches!(err, CliError::App(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_save_for_later_and_clear() {
        let mut app = state();
        let mut buf = Vec::new();
        add(&mut app, args(1, "Mug", 250), &mut buf).unwrap();
        add(&mut app, args(2, "Kettle", 1500), &mut buf).unwrap();
        save_for_later(&mut app, ProductId::new(1), &mut buf).unwrap();
        clear(&mut app, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Saved product 1 for later."));
        assert!(text.ends_with("Your cart is now empty.\n"));
        assert!(app.cart().is_empty());
        assert_eq!(app.wishlist().len(), 1);
    }

    #[test]
    fn test_huge_price_keeps_show_working() {
        let mut app = state();
        let mut buf = Vec::new();
        let mut huge = args(1, "Gold Bar", 0);
        huge.price = Decimal::MAX;
        add(&mut app, huge, &mut buf).unwrap();

        let mut large = args(2, "Diamond", 0);
        large.price = bazaar_core::MAX_SUBTOTAL;
        add(&mut app, large, &mut buf).unwrap();
        update(&mut app, ProductId::new(2), 2, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Gold Bar would take your cart over its limit; cart unchanged."));
        assert!(text.contains("Added Diamond to your cart."));
        assert!(text.contains("That quantity would take your cart over its limit; cart unchanged."));
        assert_eq!(app.cart().item_count(), 1);

        let mut buf = Vec::new();
        show(&app, &mut buf).unwrap();
        assert!(output(buf).contains("Diamond"));
    }
}
