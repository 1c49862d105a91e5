//! Smoke test against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded database (`pencraft-cli migrate && pencraft-cli seed`)
//! - The storefront running (`cargo run -p pencraft-storefront`)
//!
//! Run with: `cargo test -p pencraft-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use pencraft_client::{CartController, HttpCartApi, MemoryStorage};
use pencraft_integration_tests::moscow_address;

fn base_url() -> String {
    std::env::var("PENCRAFT_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
}

#[tokio::test]
#[ignore = "Requires a running storefront with the launch catalog"]
async fn test_guest_to_order_over_http() {
    let mut cart = CartController::new(HttpCartApi::new(base_url()), MemoryStorage::new());
    cart.restore().await.unwrap();
    cart.load_catalog().await.unwrap();
    assert!(!cart.catalog().is_empty());

    let product = cart.catalog()[0].id;
    cart.add(product, 1).await.unwrap();

    let email = format!("smoke-{}@pencraft.ru", chrono::Utc::now().timestamp_millis());
    let report = cart.register("Smoke Test", &email, "secret1").await.unwrap();
    assert_eq!(report.merged, 1);
    assert_eq!(cart.lines().len(), 1);

    let order = cart.checkout(&moscow_address()).await.unwrap();
    assert_eq!(order.items.len(), 1);
    assert!(cart.lines().is_empty());
}
