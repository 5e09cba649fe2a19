//! Command implementations.
//!
//! Each command gets a [`Shop`]: the API client, the profile's records, the
//! identity provider and a started cart store.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::io::{self, BufRead, Write};

use thiserror::Error;

use shopfront_client::api::{ApiClient, ApiError};
use shopfront_client::cart::CartStore;
use shopfront_client::checkout::CheckoutError;
use shopfront_client::config::ClientConfig;
use shopfront_client::error::CartError;
use shopfront_client::identity::{IdentityError, IdentityProvider};
use shopfront_client::storage::{FileStorage, LocalStore, StorageError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Cannot open profile: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Failed to read input: {0}")]
    Input(#[from] io::Error),

    /// The command cannot be carried out as asked.
    #[error("{0}")]
    Invalid(String),

    #[error("You must be logged in to do that. Run `shop login` first.")]
    NotSignedIn,
}

/// Everything a command can act on.
pub struct Shop {
    pub api: ApiClient,
    pub identity: IdentityProvider<FileStorage>,
    pub cart: CartStore<ApiClient, FileStorage>,
}

impl Shop {
    /// Open the profile, restore the session and load the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile directory cannot be created.
    pub async fn open(api: ApiClient, config: &ClientConfig) -> Result<Self, CommandError> {
        let local = LocalStore::new(FileStorage::open(&config.profile_dir)?);

        let identity = IdentityProvider::new(api.clone(), local.clone());
        let mut auth = identity.subscribe();
        identity.restore();

        let cart = CartStore::start(api.clone(), local, &mut auth).await;
        Ok(Self {
            api,
            identity,
            cart,
        })
    }

    /// Hand the current identity to the cart store.
    pub async fn sync_identity(&mut self) {
        let auth = self.identity.current();
        self.cart.handle_identity(&auth).await;
    }
}

/// Print `label` and read one line from stdin.
pub fn prompt(label: &str) -> Result<String, CommandError> {
    let mut out = io::stdout().lock();
    write!(out, "{label}: ")?;
    out.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
