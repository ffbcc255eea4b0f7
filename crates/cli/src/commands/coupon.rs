//! Coupon commands.

use std::io::Write;

use bazaar_core::Price;
use bazaar_storefront::AppState;
use bazaar_storefront::coupons::CouponValidator;
use bazaar_storefront::storage::KeyValueStore;

use super::CliError;

/// Validate `code` against the current subtotal and apply it.
pub async fn apply<S, V>(
    state: &mut AppState<S, V>,
    code: &str,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let coupon = state.apply_coupon(code).await?;
    let discount = Price::new(coupon.discount, state.currency());

    writeln!(out, "Applied {}: you save {discount}.", coupon.label())?;
    writeln!(out, "Total: {}", state.cart_view()?.total)?;
    Ok(())
}

/// Remove the applied coupon.
pub fn remove<S, V>(state: &mut AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    match state.remove_coupon()? {
        Some(coupon) => writeln!(out, "Removed coupon {}.", coupon.code)?,
        None => writeln!(out, "No coupon is applied.")?,
    }
    Ok(())
}
