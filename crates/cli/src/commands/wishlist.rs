//! Wishlist commands.

use std::io::Write;

use bazaar_core::{Price, ProductId};
use bazaar_storefront::AppState;
use bazaar_storefront::cart::AddOutcome;
use bazaar_storefront::coupons::CouponValidator;
use bazaar_storefront::storage::KeyValueStore;
use bazaar_storefront::wishlist::WishlistAdd;

use super::{CliError, ProductArgs};

/// List saved products.
pub fn show<S, V>(state: &AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let items = state.wishlist();
    if items.is_empty() {
        writeln!(out, "Your wishlist is empty.")?;
        return Ok(());
    }

    for item in items {
        writeln!(
            out,
            "{:>6}  {:<32} {:>12}",
            item.id,
            item.name,
            Price::new(item.price, state.currency()).display()
        )?;
    }
    Ok(())
}

/// Save a product.
pub fn add<S, V>(
    state: &mut AppState<S, V>,
    product: ProductArgs,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let item = product.into_wishlist_item()?;
    let name = item.name.clone();

    match state.add_to_wishlist(item)? {
        WishlistAdd::Added => writeln!(out, "Saved {name} to your wishlist.")?,
        WishlistAdd::AlreadySaved => writeln!(out, "{name} is already in your wishlist.")?,
    }
    Ok(())
}

/// Remove a saved product.
pub fn remove<S, V>(
    state: &mut AppState<S, V>,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    let removed = state.remove_from_wishlist(id)?;
    writeln!(out, "Removed {} from your wishlist.", removed.name)?;
    Ok(())
}

/// Move a saved product into the cart.
pub fn move_to_cart<S, V>(
    state: &mut AppState<S, V>,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    match state.move_to_cart(id)? {
        AddOutcome::Added => writeln!(out, "Moved product {id} to your cart.")?,
        AddOutcome::AlreadyInCart => {
            writeln!(out, "Product {id} was already in your cart; removed it from your wishlist.")?;
        }
        AddOutcome::OverLimit => {
            writeln!(out, "Product {id} would take your cart over its limit; kept it in your wishlist.")?;
        }
    }
    Ok(())
}

/// Remove every saved product.
pub fn clear<S, V>(state: &mut AppState<S, V>, out: &mut impl Write) -> Result<(), CliError>
where
    S: KeyValueStore + Clone,
    V: CouponValidator,
{
    state.clear_wishlist()?;
    writeln!(out, "Your wishlist is now empty.")?;
    Ok(())
}
