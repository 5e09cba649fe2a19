//! Coupon codes and discounts.
//!
//! Discounts are always computed by the pricing endpoint; the client only
//! carries the results around.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Price;

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    #[error("coupon code cannot be empty")]
    Empty,
}

/// A coupon code, trimmed and upper-cased the way the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Parse a code typed by the shopper.
    ///
    /// # Errors
    ///
    /// Returns [`CouponCodeError::Empty`] for blank input.
    pub fn parse(input: &str) -> Result<Self, CouponCodeError> {
        let code = input.trim();
        if code.is_empty() {
            return Err(CouponCodeError::Empty);
        }
        Ok(Self(code.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

/// The pricing endpoint's answer for a code and a cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub discount: Price,
    pub discounted_total: Price,
}

/// A coupon currently applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub discount: Price,
}

/// The locally persisted record of the applied coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSnapshot {
    pub code: CouponCode,
    pub discount: Price,
    pub final_total: Price,
}
