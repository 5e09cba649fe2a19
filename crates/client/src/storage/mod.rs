//! Durable client-side storage.
//!
//! [`Storage`] is a plain string key/value store with the semantics of a
//! browser's local storage: synchronous, shared by everything running
//! against the same profile, no locking. [`LocalStore`] layers the typed
//! records of the storefront on top.
//!
//! # Records
//!
//! | Key                 | Value                                  |
//! |---------------------|----------------------------------------|
//! | `cart`              | guest cart, JSON array of line items   |
//! | `appliedCoupon`     | `{ code, discount, finalTotal }`       |
//! | `token`             | bearer token, raw string               |
//! | `user`              | cached profile `{ _id, name, email }`  |
//! | `guestShippingInfo` | shipping address a guest is entering   |
//! | `mergedLines`       | `{ user, lines }` sent during a merge  |
//!
//! # Concurrency
//!
//! Two processes (or two tabs) using the same profile race: whoever writes
//! last wins, and the other's change is lost. Nothing here tries to detect
//! or merge concurrent writes.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use shopfront_core::{CartLineItem, CouponSnapshot, Identity, LineId, ShippingAddress, UserId};

use crate::api::BearerToken;

/// Storage keys.
pub mod keys {
    pub const GUEST_CART: &str = "cart";
    pub const APPLIED_COUPON: &str = "appliedCoupon";
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const GUEST_SHIPPING: &str = "guestShippingInfo";
    pub const MERGED_LINES: &str = "mergedLines";
}

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be used as a storage key.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A record could not be serialized.
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string key/value store.
pub trait Storage: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// LocalStore
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct MergeProgress {
    user: UserId,
    lines: Vec<LineId>,
}

/// Typed access to the storefront's records.
///
/// Reads never fail: an unreadable or corrupt record is logged and treated
/// as absent, the same way a storefront page would fall back to an empty
/// cart.
#[derive(Debug, Clone)]
pub struct LocalStore<S> {
    storage: S,
}

impl<S: Storage> LocalStore<S> {
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying key/value store.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // -------------------------------------------------------------------------
    // Guest cart
    // -------------------------------------------------------------------------

    /// The guest cart; empty when absent or unreadable.
    #[must_use]
    pub fn guest_cart(&self) -> Vec<CartLineItem> {
        self.read(keys::GUEST_CART).unwrap_or_default()
    }

    /// Replace the guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save_guest_cart(&self, items: &[CartLineItem]) -> Result<(), StorageError> {
        self.write(keys::GUEST_CART, items)
    }

    /// Delete the guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    pub fn clear_guest_cart(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_CART)
    }

    /// Guest lines already accepted into `user`'s server cart by an
    /// unfinished merge. Progress recorded for another user does not count.
    #[must_use]
    pub fn merged_lines(&self, user: &UserId) -> Vec<LineId> {
        self.read::<MergeProgress>(keys::MERGED_LINES)
            .filter(|progress| &progress.user == user)
            .map(|progress| progress.lines)
            .unwrap_or_default()
    }

    /// Record merge progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save_merged_lines(&self, user: &UserId, lines: &[LineId]) -> Result<(), StorageError> {
        let progress = MergeProgress {
            user: user.clone(),
            lines: lines.to_vec(),
        };
        self.write(keys::MERGED_LINES, &progress)
    }

    /// Delete the guest cart together with its merge progress.
    ///
    /// # Errors
    ///
    /// Returns an error if either record cannot be deleted.
    pub fn finish_merge(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_CART)?;
        self.storage.remove(keys::MERGED_LINES)
    }

    // -------------------------------------------------------------------------
    // Applied coupon
    // -------------------------------------------------------------------------

    /// The last applied coupon.
    #[must_use]
    pub fn coupon(&self) -> Option<CouponSnapshot> {
        self.read(keys::APPLIED_COUPON)
    }

    /// Write the applied coupon, or delete the record for `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save_coupon(&self, snapshot: Option<&CouponSnapshot>) -> Result<(), StorageError> {
        match snapshot {
            Some(snapshot) => self.write(keys::APPLIED_COUPON, snapshot),
            None => self.storage.remove(keys::APPLIED_COUPON),
        }
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// The stored token and cached profile.
    ///
    /// Both must be present. A token whose profile is unreadable is useless,
    /// so the profile record is deleted and the shopper is a guest.
    #[must_use]
    pub fn session(&self) -> Option<(BearerToken, Identity)> {
        let token = match self.storage.get(keys::TOKEN) {
            Ok(Some(token)) if !token.trim().is_empty() => BearerToken::new(token.trim()),
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                return None;
            }
        };

        let Some(identity) = self.read::<Identity>(keys::USER) else {
            if let Err(e) = self.storage.remove(keys::USER) {
                warn!(error = %e, "Failed to remove unreadable profile");
            }
            return None;
        };

        Some((token, identity))
    }

    /// Store a token and its profile.
    ///
    /// # Errors
    ///
    /// Returns an error if either record cannot be written.
    pub fn save_session(&self, token: &BearerToken, identity: &Identity) -> Result<(), StorageError> {
        self.storage.set(keys::TOKEN, token.expose())?;
        self.write(keys::USER, identity)
    }

    /// Delete the token and the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if either record cannot be deleted.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::TOKEN)?;
        self.storage.remove(keys::USER)
    }

    // -------------------------------------------------------------------------
    // Guest shipping details
    // -------------------------------------------------------------------------

    /// The shipping details a guest has entered so far.
    #[must_use]
    pub fn guest_shipping(&self) -> Option<ShippingAddress> {
        self.read(keys::GUEST_SHIPPING)
    }

    /// Remember a guest's shipping details until the order goes through.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save_guest_shipping(&self, address: &ShippingAddress) -> Result<(), StorageError> {
        self.write(keys::GUEST_SHIPPING, address)
    }

    /// Forget guest shipping details.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    pub fn clear_guest_shipping(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_SHIPPING)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read local record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Ignoring corrupt local record");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.storage.set(key, &raw)
    }
}
