//! Guest carts, sign-in merges and signed-in cart mirroring.

#![allow(clippy::unwrap_used)]

use shopfront_client::api::ApiClient;
use shopfront_client::storage::{LocalStore, MemoryStorage};
use shopfront_core::{Price, ProductId, ProductSnapshot, Variant};
use shopfront_integration_tests::{FakeBackend, Shopper};

async fn snapshot(api: &ApiClient, id: &str) -> ProductSnapshot {
    let detail = api.product(&ProductId::new(id)).await.unwrap();
    ProductSnapshot::from(&detail.product)
}

async fn backend() -> (FakeBackend, String) {
    let backend = FakeBackend::spawn().await;
    backend.add_product("P1", "Runner", 500, &["S", "M"]);
    backend.add_product("P2", "Trail", 800, &[]);
    let user = backend.add_user("Asha", "asha@example.com", "secret");
    (backend, user)
}

#[tokio::test]
async fn test_guest_cart_stays_local() {
    let (backend, _) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;
    backend.reset_requests();

    let p1 = snapshot(&shopper.api, "P1").await;
    shopper.cart.add_item(p1.clone(), Variant::sized("M")).await;
    shopper.cart.add_item(p1, Variant::sized("M")).await;

    assert!(backend.requests().iter().all(|r| !r.contains("/cart")));
    assert_eq!(LocalStore::new(storage.clone()).guest_cart()[0].quantity, 2);

    // A reload finds the same cart.
    let reloaded = Shopper::open(&backend, storage).await;
    assert_eq!(reloaded.cart.snapshot().item_count(), 2);
}

#[tokio::test]
async fn test_login_merges_guest_cart() {
    let (backend, user) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;

    let p1 = snapshot(&shopper.api, "P1").await;
    let line = shopper.cart.add_item(p1, Variant::sized("M")).await.unwrap();
    shopper.cart.update_quantity(&line, 2).await;

    shopper.login("asha@example.com", "secret").await;

    assert_eq!(backend.cart_of(&user), vec![("P1".to_string(), Some("M".to_string()), 2)]);
    assert!(LocalStore::new(storage).guest_cart().is_empty());

    let state = shopper.cart.snapshot();
    assert_eq!(state.item_count(), 2);
    assert_eq!(state.subtotal(), Price::from_units(1000));
    assert!(state.items()[0].line_id.as_str().starts_with("line"));
}

#[tokio::test]
async fn test_merge_adds_to_existing_server_lines() {
    let (backend, user) = backend().await;
    backend.seed_cart_line(&user, "P1", Some("M"), 1);
    backend.seed_cart_line(&user, "P2", None, 1);
    let mut shopper = Shopper::open(&backend, MemoryStorage::new()).await;

    let p1 = snapshot(&shopper.api, "P1").await;
    shopper.cart.add_item(p1.clone(), Variant::sized("M")).await;
    shopper.cart.add_item(p1, Variant::sized("S")).await;
    shopper.login("asha@example.com", "secret").await;

    let mut server = backend.cart_of(&user);
    server.sort();
    assert_eq!(
        server,
        vec![
            ("P1".to_string(), Some("M".to_string()), 2),
            ("P1".to_string(), Some("S".to_string()), 1),
            ("P2".to_string(), None, 1),
        ]
    );
    assert_eq!(shopper.cart.snapshot().item_count(), 4);
}

#[tokio::test]
async fn test_reload_while_signed_in_loads_server_cart() {
    let (backend, user) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;
    shopper.login("asha@example.com", "secret").await;
    assert!(shopper.cart.snapshot().is_empty());

    backend.seed_cart_line(&user, "P2", None, 3);
    let reloaded = Shopper::open(&backend, storage).await;

    assert!(reloaded.cart.session().is_some());
    let state = reloaded.cart.snapshot();
    assert_eq!(state.item_count(), 3);
    assert_eq!(state.subtotal(), Price::from_units(2400));
}

#[tokio::test]
async fn test_signed_in_mutations_reach_server() {
    let (backend, user) = backend().await;
    let mut shopper = Shopper::open(&backend, MemoryStorage::new()).await;
    shopper.login("asha@example.com", "secret").await;

    let p1 = snapshot(&shopper.api, "P1").await;
    let p2 = snapshot(&shopper.api, "P2").await;
    let line = shopper.cart.add_item(p1, Variant::sized("S")).await.unwrap();
    shopper.cart.add_item(p2, Variant::default()).await;

    shopper.cart.update_quantity(&line, 4).await;
    assert!(backend.cart_of(&user).contains(&("P1".to_string(), Some("S".to_string()), 4)));

    let line = shopper.cart.snapshot().items()[0].line_id.clone();
    shopper.cart.update_quantity(&line, 1).await;
    assert!(backend.cart_of(&user).contains(&("P1".to_string(), Some("S".to_string()), 1)));

    // The local line follows the server's new id.
    let line = shopper.cart.snapshot().items()[0].line_id.clone();
    shopper.cart.remove_item(&line).await;
    assert_eq!(backend.cart_of(&user), vec![("P2".to_string(), None, 1)]);

    shopper.cart.clear().await;
    assert!(backend.cart_of(&user).is_empty());
    assert!(shopper.cart.snapshot().is_empty());
}

#[tokio::test]
async fn test_logout_returns_to_empty_guest_cart() {
    let (backend, _) = backend().await;
    let storage = MemoryStorage::new();
    let mut shopper = Shopper::open(&backend, storage.clone()).await;
    let p2 = snapshot(&shopper.api, "P2").await;
    shopper.cart.add_item(p2, Variant::default()).await;
    shopper.login("asha@example.com", "secret").await;

    shopper.logout().await;

    assert!(shopper.cart.session().is_none());
    assert!(shopper.cart.snapshot().is_empty());
    assert!(LocalStore::new(storage).session().is_none());
}
