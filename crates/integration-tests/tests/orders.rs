//! Checkout, order history and cancellation.

#![allow(clippy::unwrap_used)]

use shopfront_client::api::ApiError;
use shopfront_client::checkout::{Checkout, CheckoutError, PLACEHOLDER_PAYMENT};
use shopfront_client::storage::{LocalStore, MemoryStorage};
use shopfront_core::{OrderStatus, ProductId, ProductSnapshot, ShippingAddress, Variant};
use shopfront_integration_tests::{FakeBackend, Shopper};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        address_line: "12 MG Road".into(),
        city: "Pune".into(),
        postal_code: "411001".into(),
        state: "MH".into(),
        country: "India".into(),
        phone: "9999999999".into(),
    }
}

async fn backend() -> (FakeBackend, String) {
    let backend = FakeBackend::spawn().await;
    backend.add_product("A", "Runner", 500, &["M"]);
    backend.add_coupon("SAVE10", 10, false);
    let user = backend.add_user("Asha", "asha@example.com", "secret");
    (backend, user)
}

async fn add_runner(shopper: &mut Shopper<MemoryStorage>, quantity: i64) {
    let detail = shopper.api.product(&ProductId::new("A")).await.unwrap();
    let line = shopper
        .cart
        .add_item(ProductSnapshot::from(&detail.product), Variant::sized("M"))
        .await
        .unwrap();
    shopper.cart.update_quantity(&line, quantity).await;
}

#[tokio::test]
async fn test_guest_checkout() {
    let (backend, _) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;
    add_runner(&mut shopper, 2).await;
    let checkout = Checkout::new(shopper.api.clone());

    let order = checkout
        .place_order(&mut shopper.cart, address(), PLACEHOLDER_PAYMENT)
        .await
        .unwrap();

    assert!(order.guest);
    assert!(order.user.is_none());
    assert_eq!(order.status, OrderStatus::Processing);

    let sent = &backend.orders()[0];
    assert_eq!(sent["totalPrice"], 1000.0);
    assert_eq!(sent["orderItems"][0]["size"], "M");
    assert_eq!(sent["paymentMethod"], "Placeholder");

    assert!(shopper.cart.snapshot().is_empty());
    let local = LocalStore::new(storage);
    assert!(local.guest_cart().is_empty());
    assert!(local.guest_shipping().is_none());
}

#[tokio::test]
async fn test_incomplete_address_keeps_draft() {
    let (backend, _) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;
    add_runner(&mut shopper, 1).await;
    let checkout = Checkout::new(shopper.api.clone());

    let partial = ShippingAddress {
        phone: String::new(),
        ..address()
    };
    checkout.save_draft(&shopper.cart, &partial);
    let err = checkout
        .place_order(&mut shopper.cart, partial.clone(), PLACEHOLDER_PAYMENT)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::MissingFields(ref fields) if fields == &["phone"]));
    assert!(backend.orders().is_empty());

    // The next page load picks up where the guest left off.
    let reloaded = Shopper::open(&backend, storage).await;
    assert_eq!(checkout.draft_address(&reloaded.cart), partial);
    assert_eq!(reloaded.cart.snapshot().item_count(), 1);
}

#[tokio::test]
async fn test_signed_in_checkout_history_and_cancel() {
    let (backend, user) = backend().await;
    let mut shopper = Shopper::open(&backend, MemoryStorage::new()).await;
    shopper.login("asha@example.com", "secret").await;
    add_runner(&mut shopper, 2).await;
    shopper.cart.apply_coupon("SAVE10").await.unwrap();
    let checkout = Checkout::new(shopper.api.clone());

    let order = checkout
        .place_order(&mut shopper.cart, address(), PLACEHOLDER_PAYMENT)
        .await
        .unwrap();

    assert_eq!(order.user.as_ref().unwrap().as_str(), user);
    assert_eq!(backend.orders()[0]["totalPrice"], 900.0);
    assert!(backend.cart_of(&user).is_empty());

    let token = shopper.cart.session().unwrap().token.clone();
    let history = shopper.api.order_history(&token).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);

    let cancelled = shopper.api.cancel_order(&token, &order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let err = shopper.api.cancel_order(&token, &order.id).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::NotFound(ref message) if message == "Order not found or already cancelled"
    ));
}

#[tokio::test]
async fn test_history_requires_valid_token() {
    let (backend, _) = backend().await;
    let shopper = Shopper::open(&backend, MemoryStorage::new()).await;

    let err = shopper
        .api
        .order_history(&shopfront_client::api::BearerToken::new("tok-nobody"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
}
