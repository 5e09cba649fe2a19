//! REST client for the Shopfront backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; every endpoint hangs off one base URL
//! - The server is the source of truth for authenticated carts
//! - In-memory caching via `moka` for catalog reads (configurable TTL)
//! - Server payloads are normalized at this boundary before anything else
//!   sees them; the cart store only ever handles canonical line items
//!
//! # Endpoints
//!
//! | Area    | Calls                                                        |
//! |---------|--------------------------------------------------------------|
//! | Cart    | `GET /cart`, `POST /cart`, `DELETE /cart/:line`, `DELETE /cart` |
//! | Coupons | `POST /coupons/apply`                                        |
//! | Catalog | `GET /products`, `/products/:id`, `/products/search`, ...    |
//! | Orders  | `POST /orders`, `GET /orders/history`, `PUT /orders/:id/cancel` |
//! | Users   | `POST /users/login`, `POST /users/register`                  |
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::api::{ApiClient, CartGateway};
//!
//! let client = ApiClient::new(&config.api);
//! let session = client.login(&email, &password).await?;
//! let cart = client.fetch_cart(&session.token).await?;
//! ```

mod cache;
mod cart;
mod catalog;
mod client;
mod conversions;
mod orders;
mod users;
mod wire;

pub use cart::{CartGateway, RemoteCart, RemoteLine};
pub use client::ApiClient;

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Missing, expired or rejected bearer token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    /// The message the server put in its error body, if there was one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Rejected { message, .. } => Some(message),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => None,
        }
    }

    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Rejected { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => None,
        }
    }

    /// Whether the request never got an answer from the server.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// The token a signed-in shopper sends as `Authorization: Bearer ...`.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header and local storage.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl PartialEq for BearerToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for BearerToken {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{token:?}"), "BearerToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }

    #[test]
    fn test_server_message() {
        let err = ApiError::Rejected {
            status: 400,
            message: "Coupon expired".to_string(),
        };
        assert_eq!(err.server_message(), Some("Coupon expired"));
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Request rejected (400): Coupon expired");

        let err = ApiError::NotFound("Invalid coupon code".to_string());
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transport());
    }
}
