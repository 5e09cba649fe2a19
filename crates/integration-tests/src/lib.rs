//! Integration tests for Shopfront.
//!
//! The client crates run against [`FakeBackend`], an axum server on an
//! ephemeral port that mimics the storefront REST API. No external services
//! are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_merge` - Guest cart merged into the account cart at sign-in
//! - `coupons` - Coupon pricing, failures and persistence
//! - `catalog` - Listings, search, product pages, deleted products
//! - `orders` - Checkout, history and cancellation
//! - `profile` - File-backed records shared between runs

pub mod backend;

pub use backend::FakeBackend;

use secrecy::SecretString;

use shopfront_client::api::ApiClient;
use shopfront_client::cart::CartStore;
use shopfront_client::config::ApiConfig;
use shopfront_client::identity::IdentityProvider;
use shopfront_client::storage::{LocalStore, Storage};

/// One front end session against the fake backend: what a page load sets up.
pub struct Shopper<S> {
    pub api: ApiClient,
    pub identity: IdentityProvider<S>,
    pub cart: CartStore<ApiClient, S>,
}

impl<S: Storage + Clone> Shopper<S> {
    /// Restore identity from `storage` and start the cart store.
    ///
    /// # Panics
    ///
    /// Panics if the backend URL is not a valid API base URL.
    pub async fn open(backend: &FakeBackend, storage: S) -> Self {
        let config = ApiConfig::new(&backend.base_url()).expect("valid base url");
        let api = ApiClient::new(&config);
        let local = LocalStore::new(storage);

        let identity = IdentityProvider::new(api.clone(), local.clone());
        let mut auth = identity.subscribe();
        identity.restore();

        let cart = CartStore::start(api.clone(), local, &mut auth).await;
        Self {
            api,
            identity,
            cart,
        }
    }

    /// Sign in and let the cart store react.
    ///
    /// # Panics
    ///
    /// Panics if the credentials are rejected.
    pub async fn login(&mut self, email: &str, password: &str) {
        self.identity
            .login(email, &SecretString::from(password.to_string()))
            .await
            .expect("login");
        let auth = self.identity.current();
        self.cart.handle_identity(&auth).await;
    }

    /// Sign out and let the cart store react.
    pub async fn logout(&mut self) {
        self.identity.logout();
        let auth = self.identity.current();
        self.cart.handle_identity(&auth).await;
    }
}
