//! Request and response bodies as the backend spells them.
//!
//! Nothing here leaves the `api` module: the conversions module turns the
//! server shapes into core types.

use serde::{Deserialize, Serialize};

use shopfront_core::{CouponCode, Email, LineId, Price, ProductId, UserId};

/// Body of every non-success response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// =============================================================================
// Cart
// =============================================================================

/// A server cart document.
#[derive(Debug, Deserialize)]
pub struct ServerCart {
    #[serde(default)]
    pub items: Vec<ServerCartLine>,
}

/// One line of a server cart.
#[derive(Debug, Deserialize)]
pub struct ServerCartLine {
    #[serde(rename = "_id")]
    pub id: LineId,
    /// Populated on reads, a bare id in mutation responses, null once the
    /// product has been deleted from the catalog.
    #[serde(default)]
    pub product: Option<ProductRef>,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
}

/// The `product` field of a server cart line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Populated(ServerProduct),
    Id(ProductId),
}

/// The product projection the cart endpoint populates.
#[derive(Debug, Deserialize)]
pub struct ServerProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
}

/// Body of `POST /coupons/apply`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponBody<'a> {
    pub code: &'a CouponCode,
    pub cart_total: Price,
}

// =============================================================================
// Users
// =============================================================================

/// Body of `POST /users/login`.
#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /users/register`.
#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Answer of both user endpoints: the profile plus a fresh token.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub token: String,
}
