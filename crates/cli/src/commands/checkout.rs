//! Checkout command.
//!
//! Prints the order draft that order placement would receive.

use std::io::Write;

use bazaar_core::Price;
use bazaar_storefront::AppState;
use bazaar_storefront::coupons::CouponValidator;
use bazaar_storefront::storage::KeyValueStore;

use super::CliError;

/// Re-validate the coupon and print an order draft.
pub async fn run<S, V>(
    state: &mut AppState<S, V>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let draft = state.checkout().await?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &draft)?;
        writeln!(out)?;
        return Ok(());
    }

    let money = |amount| Price::new(amount, draft.currency).display();
    writeln!(out, "Order draft {}", draft.id)?;
    writeln!(out, "Units:    {}", draft.unit_count())?;
    writeln!(out, "Subtotal: {}", money(draft.totals.subtotal))?;
    if let Some(code) = &draft.coupon_code {
        writeln!(out, "Discount: {} [{code}]", money(-draft.totals.discount))?;
    }
    writeln!(out, "Shipping: {}", money(draft.totals.shipping))?;
    writeln!(out, "Tax:      {}", money(draft.totals.tax))?;
    writeln!(out, "Total:    {}", money(draft.totals.total))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{args, output, state};
    use super::*;
    use bazaar_core::{OrderDraft, ProductId};
    use bazaar_storefront::AppError;
    use bazaar_storefront::checkout::CheckoutError;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_empty_cart() {
        let mut app = state();
        let mut buf = Vec::new();
        let err = run(&mut app, false, &mut buf).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::App(AppError::Checkout(CheckoutError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_summary() {
        let mut app = state();
        app.add_to_cart(args(1, "Kettle", 1500).into_product().unwrap())
            .unwrap();

        let mut buf = Vec::new();
        run(&mut app, false, &mut buf).await.unwrap();
        let text = output(buf);
        assert!(text.starts_with("Order draft "));
        assert!(text.contains("Shipping: ₹0.00"));
        assert!(text.contains("Total:    ₹1770.00"));
    }

    #[tokio::test]
    async fn test_json_draft() {
        let mut app = state();
        app.add_to_cart(args(2, "Mug", 250).into_product().unwrap())
            .unwrap();
        app.update_quantity(ProductId::new(2), 2).unwrap();

        let mut buf = Vec::new();
        run(&mut app, true, &mut buf).await.unwrap();
        let draft: OrderDraft = serde_json::from_str(&output(buf)).unwrap();

        assert_eq!(draft.unit_count(), 2);
        assert_eq!(draft.totals.subtotal, Decimal::new(500, 0));
        assert_eq!(draft.totals.total, Decimal::new(689, 0));
        assert!(draft.coupon_code.is_none());
    }
}
