//! Integration tests for order draft preparation.
//!
//! Checkout always asks the coupon service again, even when an earlier
//! validation is cached.

#![allow(clippy::unwrap_used)]

use bazaar_core::ProductId;
use bazaar_integration_tests::{TestContext, accepted, product, rejected};
use bazaar_storefront::AppError;
use bazaar_storefront::checkout::CheckoutError;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_checkout_revalidates_coupon() {
    let ctx = TestContext::new().await;
    ctx.mock_coupon("SAVE100", 200, accepted("SAVE100", 100))
        .await;

    let mut state = ctx.open_state();
    state.add_to_cart(product(1, 500)).unwrap();
    state.update_quantity(ProductId::new(1), 2).unwrap();
    state.apply_coupon("SAVE100").await.unwrap();
    assert_eq!(ctx.request_count().await, 1);

    let draft = state.checkout().await.unwrap();
    assert_eq!(ctx.request_count().await, 2);

    assert_eq!(draft.coupon_code.as_deref(), Some("SAVE100"));
    assert_eq!(draft.unit_count(), 2);
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.totals.total, Decimal::new(1062, 0));

    // Checkout does not consume the cart
    assert_eq!(state.cart().item_count(), 2);
}

#[tokio::test]
async fn test_checkout_drops_coupon_no_longer_valid() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .and(body_partial_json(json!({ "code": "MIN1000" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted("MIN1000", 100)))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    ctx.mock_coupon("MIN1000", 200, rejected("Minimum order ₹1000 not met"))
        .await;

    let mut state = ctx.open_state();
    state.add_to_cart(product(1, 500)).unwrap();
    state.add_to_cart(product(2, 500)).unwrap();
    state.apply_coupon("MIN1000").await.unwrap();
    state.remove_from_cart(ProductId::new(2)).unwrap();

    let err = state.checkout().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::CouponRemoved { ref code, .. }) if code == "MIN1000"
    ));
    assert!(state.applied_coupon().is_none());
    assert_eq!(state.totals().unwrap().discount, Decimal::ZERO);

    // The removal is persisted
    assert!(ctx.open_state().applied_coupon().is_none());
}

#[tokio::test]
async fn test_checkout_keeps_coupon_when_service_down() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/coupons/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted("SAVE", 25)))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;

    let mut state = ctx.open_state();
    state.add_to_cart(product(1, 300)).unwrap();
    state.apply_coupon("SAVE").await.unwrap();

    let err = state.checkout().await.unwrap_err();
    assert!(matches!(err, AppError::Checkout(CheckoutError::CouponCheck(_))));
    assert!(err.is_server_error());
    assert_eq!(
        err.user_message(),
        "We could not verify your coupon. Please try again."
    );
    assert_eq!(state.applied_coupon().unwrap().code, "SAVE");
}

#[tokio::test]
async fn test_checkout_without_coupon_makes_no_request() {
    let ctx = TestContext::new().await;
    let mut state = ctx.open_state();
    state.add_to_cart(product(1, 999)).unwrap();

    let draft = state.checkout().await.unwrap();
    assert_eq!(ctx.request_count().await, 0);
    assert_eq!(draft.totals.shipping, Decimal::ZERO);
    assert!(draft.coupon_code.is_none());
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let ctx = TestContext::new().await;
    let mut state = ctx.open_state();

    let err = state.checkout().await.unwrap_err();
    assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
}
