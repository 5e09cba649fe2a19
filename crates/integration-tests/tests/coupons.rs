//! Coupon pricing against the coupon endpoint.

#![allow(clippy::unwrap_used)]

use shopfront_client::error::CartError;
use shopfront_client::storage::{LocalStore, MemoryStorage};
use shopfront_core::{Price, ProductId, ProductSnapshot, Variant};
use shopfront_integration_tests::{FakeBackend, Shopper};

async fn signed_in(backend: &FakeBackend, storage: MemoryStorage) -> Shopper<MemoryStorage> {
    let mut shopper = Shopper::open(backend, storage).await;
    shopper.login("asha@example.com", "secret").await;
    shopper
}

async fn add(shopper: &mut Shopper<MemoryStorage>, id: &str, quantity: i64) {
    let detail = shopper.api.product(&ProductId::new(id)).await.unwrap();
    let line = shopper
        .cart
        .add_item(ProductSnapshot::from(&detail.product), Variant::default())
        .await
        .unwrap();
    shopper.cart.update_quantity(&line, quantity).await;
}

async fn backend() -> FakeBackend {
    let backend = FakeBackend::spawn().await;
    backend.add_product("A", "Runner", 500, &[]);
    backend.add_product("ODD", "Sock", 333, &[]);
    backend.add_coupon("SAVE10", 10, false);
    backend.add_coupon("SAVE15", 15, false);
    backend.add_coupon("OLD", 50, true);
    backend.add_user("Asha", "asha@example.com", "secret");
    backend
}

#[tokio::test]
async fn test_save10_on_two_units() {
    let backend = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = signed_in(&backend, storage.clone()).await;
    add(&mut shopper, "A", 2).await;

    let coupon = shopper.cart.apply_coupon("save10").await.unwrap();

    assert_eq!(coupon.discount, Price::from_units(100));
    let state = shopper.cart.snapshot();
    assert_eq!(state.final_total(), Price::from_units(900));
    assert_eq!(state.applied_coupon_code().unwrap().as_str(), "SAVE10");

    let record = LocalStore::new(storage).coupon().unwrap();
    assert_eq!(record.discount, Price::from_units(100));
    assert_eq!(record.final_total, Price::from_units(900));
}

#[tokio::test]
async fn test_discount_is_rounded_by_server() {
    let backend = backend().await;
    let mut shopper = signed_in(&backend, MemoryStorage::new()).await;
    add(&mut shopper, "ODD", 1).await;

    shopper.cart.apply_coupon("SAVE15").await.unwrap();

    // 15% of 333 is 49.95.
    let state = shopper.cart.snapshot();
    assert_eq!(state.discount_amount(), Price::from_units(50));
    assert_eq!(state.final_total(), Price::from_units(283));
}

#[tokio::test]
async fn test_rejections_are_reported() {
    let backend = backend().await;
    let mut shopper = signed_in(&backend, MemoryStorage::new()).await;
    add(&mut shopper, "A", 1).await;

    let err = shopper.cart.apply_coupon("OLD").await.unwrap_err();
    assert!(matches!(err, CartError::ExpiredCoupon(_)));
    assert_eq!(shopper.cart.snapshot().coupon_error(), Some("Coupon has expired"));

    let err = shopper.cart.apply_coupon("NOPE").await.unwrap_err();
    assert!(matches!(err, CartError::InvalidCoupon(_)));
    let state = shopper.cart.snapshot();
    assert_eq!(state.coupon_error(), Some("Invalid coupon code"));
    assert_eq!(state.final_total(), Price::from_units(500));
}

#[tokio::test]
async fn test_guest_cannot_apply_coupon() {
    let backend = backend().await;
    let mut shopper = Shopper::open(&backend, MemoryStorage::new()).await;
    add(&mut shopper, "A", 1).await;
    backend.reset_requests();

    let err = shopper.cart.apply_coupon("SAVE10").await.unwrap_err();

    assert!(matches!(err, CartError::AuthRequired));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_cart_change_invalidates_coupon() {
    let backend = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = signed_in(&backend, storage.clone()).await;
    add(&mut shopper, "A", 2).await;
    shopper.cart.apply_coupon("SAVE10").await.unwrap();

    let line = shopper.cart.snapshot().items()[0].line_id.clone();
    shopper.cart.update_quantity(&line, 1).await;

    let state = shopper.cart.snapshot();
    assert!(state.applied_coupon().is_none());
    assert_eq!(state.final_total(), Price::from_units(500));
    assert!(LocalStore::new(storage).coupon().is_none());
}

#[tokio::test]
async fn test_coupon_restored_on_reload() {
    let backend = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = signed_in(&backend, storage.clone()).await;
    add(&mut shopper, "A", 2).await;
    shopper.cart.apply_coupon("SAVE10").await.unwrap();
    drop(shopper);

    let reloaded = Shopper::open(&backend, storage).await;

    let state = reloaded.cart.snapshot();
    assert_eq!(state.applied_coupon_code().unwrap().as_str(), "SAVE10");
    assert_eq!(state.final_total(), Price::from_units(900));
}
