//! End-to-end tests for cart persistence and its independence from session
//! state.

use std::path::Path;

use rust_decimal::Decimal;
use url::Url;

use sandpiper_client::{ClientConfig, OrderInput, ShippingAddress, StorefrontRuntime};
use sandpiper_core::{Email, ProductId};
use sandpiper_integration_tests::{MockApi, TEST_EMAIL, TEST_PASSWORD};

fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

fn runtime_for(mock: &MockApi, dir: &Path) -> StorefrontRuntime {
    let url = Url::parse(&mock.base_url).expect("mock url");
    StorefrontRuntime::init(ClientConfig::new(url, dir)).expect("runtime")
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Sand Piper".to_string(),
        phone: "5550100".to_string(),
        address_line1: "1 Shoreline Road".to_string(),
        address_line2: None,
        city: "Brighton".to_string(),
        state: "SXE".to_string(),
        postal_code: "BN1 1AA".to_string(),
        country: "GB".to_string(),
    }
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let mock = MockApi::spawn().await;
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut runtime = runtime_for(&mock, dir.path());
        let product = runtime.api().get_product("desk-lamp").await.expect("product");
        runtime
            .cart_mut()
            .add_item(product.snapshot(None), 2, None)
            .expect("add");
    }

    let runtime = runtime_for(&mock, dir.path());
    assert_eq!(runtime.cart().items().len(), 1);
    assert_eq!(runtime.cart().items()[0].quantity, 2);
    assert_eq!(runtime.cart().subtotal(), dec("98.00"));
}

#[tokio::test]
async fn test_cart_snapshot_layout() {
    let mock = MockApi::spawn().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let mut runtime = runtime_for(&mock, dir.path());
    let product = runtime.api().get_product("desk-lamp").await.expect("product");
    runtime
        .cart_mut()
        .add_item(product.snapshot(None), 1, None)
        .expect("add");

    // Persisted as `{ "items": [...] }` under its own durable key.
    let raw = std::fs::read_to_string(dir.path().join("cart.json")).expect("cart file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let items = value.get("items").and_then(|v| v.as_array()).expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].get("productId").and_then(|v| v.as_str()),
        Some("p1")
    );
}

#[tokio::test]
async fn test_cart_is_independent_of_session() {
    let mock = MockApi::spawn().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let mut runtime = runtime_for(&mock, dir.path());

    let email = Email::parse(TEST_EMAIL).expect("email");
    runtime.login(&email, TEST_PASSWORD).await.expect("login");

    let product = runtime.api().get_product("desk-lamp").await.expect("product");
    runtime
        .cart_mut()
        .add_item(product.snapshot(None), 3, None)
        .expect("add");

    // Logging out discards credentials but never the cart.
    runtime.logout().expect("logout");
    assert!(!runtime.session().is_authenticated());
    assert!(runtime.api().tokens().get().is_none());
    assert_eq!(runtime.cart().item_count(), 3);

    // Same holds across a restart.
    drop(runtime);
    let runtime = runtime_for(&mock, dir.path());
    assert!(!runtime.api().tokens().is_authenticated());
    assert_eq!(runtime.cart().item_count(), 3);
}

#[tokio::test]
async fn test_session_expiry_keeps_cart() {
    let mock = MockApi::spawn().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let mut runtime = runtime_for(&mock, dir.path());

    let email = Email::parse(TEST_EMAIL).expect("email");
    runtime.login(&email, TEST_PASSWORD).await.expect("login");

    let product = runtime.api().get_product("desk-lamp").await.expect("product");
    runtime
        .cart_mut()
        .add_item(product.snapshot(None), 1, None)
        .expect("add");

    mock.state.expire_access();
    mock.state.reject_refresh();
    let result = runtime.api().current_user().await;
    assert!(result.is_err());

    // The user was signed out, the cart was not.
    assert!(runtime.api().tokens().get().is_none());
    assert_eq!(runtime.cart().item_count(), 1);
}

#[tokio::test]
async fn test_order_placement_then_explicit_clear() {
    let mock = MockApi::spawn().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let mut runtime = runtime_for(&mock, dir.path());

    let email = Email::parse(TEST_EMAIL).expect("email");
    runtime.login(&email, TEST_PASSWORD).await.expect("login");

    let product = runtime.api().get_product("desk-lamp").await.expect("product");
    runtime
        .cart_mut()
        .add_item(product.snapshot(None), 2, None)
        .expect("add");

    let input = OrderInput::from_cart(runtime.cart().items(), address(), "cod");
    let order = runtime.api().place_order(&input).await.expect("order");
    assert_eq!(order.order_number, "SP-1001");

    // The engine never clears itself on remote events; the caller does,
    // once the order is confirmed.
    assert_eq!(runtime.cart().item_count(), 2);
    runtime.cart_mut().clear().expect("clear");
    assert!(runtime.cart().is_empty());

    // And the cleared state is what a restart sees.
    drop(runtime);
    let runtime = runtime_for(&mock, dir.path());
    assert!(runtime.cart().is_empty());
    assert!(!runtime
        .cart()
        .items()
        .iter()
        .any(|item| item.product_id == ProductId::new("p1")));
}
