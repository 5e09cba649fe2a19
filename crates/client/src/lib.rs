//! Shopfront client library.
//!
//! Everything a storefront front end needs besides rendering:
//!
//! - [`api`] - REST client for the cart, coupon, catalog, order and user endpoints
//! - [`storage`] - Durable client-side storage (guest cart, coupon, session)
//! - [`identity`] - Who is signed in, published on a watch channel
//! - [`cart`] - The cart state store and the guest-to-account merge
//! - [`checkout`] - Turning the cart into an order
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::{api::ApiClient, cart::CartStore, identity::IdentityProvider};
//! use shopfront_client::storage::{FileStorage, LocalStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config.api);
//! let local = LocalStore::new(FileStorage::open(&config.profile_dir)?);
//!
//! let identity = IdentityProvider::new(api.clone(), local.clone());
//! let mut auth = identity.subscribe();
//! identity.restore();
//!
//! let mut cart = CartStore::start(api.clone(), local, &mut auth).await;
//! cart.add_item(ProductSnapshot::from(&product), Variant::sized("M")).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod identity;
pub mod storage;

pub use config::ClientConfig;
pub use error::CartError;
