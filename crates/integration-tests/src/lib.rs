//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Each test gets its own mock coupon service (`wiremock`) and its own data
//! directory (`tempfile`), so tests run in parallel without sharing state.
//!
//! # Test Categories
//!
//! - `coupon_flow` - Applying, replacing and removing coupons over HTTP
//! - `checkout_flow` - Order drafts and coupon re-validation
//! - `persistence` - State surviving restarts, corrupt files

use std::collections::HashMap;

use bazaar_core::{CartProduct, ProductId};
use bazaar_storefront::AppState;
use bazaar_storefront::config::StorefrontConfig;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token the mock service expects.
pub const TEST_TOKEN: &str = "tok_9fK2pQ7xLm4Rz8Wv";

/// A mock coupon service plus a scratch data directory.
pub struct TestContext {
    pub server: MockServer,
    pub data_dir: TempDir,
}

impl TestContext {
    /// Start a mock service and create an empty data directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        Self { server, data_dir }
    }

    /// Configuration pointing at the mock service and the scratch directory.
    ///
    /// # Panics
    ///
    /// Panics if the generated configuration is rejected.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let vars: HashMap<String, String> = [
            ("BAZAAR_API_BASE_URL", self.server.uri()),
            ("BAZAAR_API_TOKEN", TEST_TOKEN.to_string()),
            (
                "BAZAAR_DATA_DIR",
                self.data_dir.path().display().to_string(),
            ),
            ("BAZAAR_HTTP_TIMEOUT_SECS", "5".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        StorefrontConfig::from_map(&vars).expect("Test configuration should be valid")
    }

    /// Open the file-backed application state, as the CLI does.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be created.
    #[must_use]
    pub fn open_state(&self) -> AppState {
        AppState::new(&self.config()).expect("Failed to open state")
    }

    /// Answer validations of `code` with `body` and `status`.
    pub async fn mock_coupon(&self, code: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/coupons/validate"))
            .and(body_partial_json(json!({ "code": code })))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the mock service has received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// Accepted validation body with a fixed discount.
#[must_use]
pub fn accepted(code: &str, discount: i64) -> Value {
    json!({
        "valid": true,
        "code": code,
        "discount_amount": discount,
        "discount_type": "fixed",
        "discount_value": discount,
        "description": format!("₹{discount} off")
    })
}

/// Rejected validation body.
#[must_use]
pub fn rejected(reason: &str) -> Value {
    json!({ "valid": false, "description": reason })
}

/// A product snapshot priced at `price`.
#[must_use]
pub fn product(id: i64, price: i64) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        sku: format!("SKU-{id}"),
        slug: format!("product-{id}"),
        price: Decimal::new(price, 0),
        image: Some(format!("https://cdn.example.com/{id}.png")),
    }
}
