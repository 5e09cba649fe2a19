//! Cart errors and Sentry helpers.
//!
//! Only coupon application reports a [`CartError`] to the caller. Background
//! sync failures are logged with `tracing::warn!` and swallowed; the local
//! state stays authoritative.

use thiserror::Error;

use shopfront_core::LineId;

use crate::api::ApiError;

/// Fallback text when a failure carries no server message.
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors of the cart state store.
#[derive(Debug, Error)]
pub enum CartError {
    /// An operation that needs a signed-in shopper was attempted as a guest.
    #[error("You must be logged in to apply coupons.")]
    AuthRequired,

    /// A coupon was applied to an empty cart.
    #[error("Cannot apply coupon to an empty cart.")]
    EmptyCart,

    /// The pricing endpoint does not know the code (or rejected it).
    #[error("{0}")]
    InvalidCoupon(String),

    /// The code exists but is past its expiry date.
    #[error("{0}")]
    ExpiredCoupon(String),

    /// The pricing endpoint answered with an unexpected failure.
    #[error("{0}")]
    CouponLookupFailed(String),

    /// A server cart line points at a product that no longer exists.
    #[error("The product in cart line {0} is no longer available")]
    ProductUnavailable(LineId),

    /// The request never reached the server, or its answer was unreadable.
    #[error("Network failure: {0}")]
    NetworkFailure(#[from] ApiError),
}

impl CartError {
    /// Classify a failed `POST /coupons/apply`.
    ///
    /// 404 is an unknown code; 400 is an expired code when the message says
    /// so and a rejected code otherwise. Transport and parse failures are
    /// network failures; everything else is a lookup failure.
    #[must_use]
    pub fn from_coupon_rejection(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(message) => Self::InvalidCoupon(message),
            ApiError::Rejected {
                status: 400,
                message,
            } => {
                if message.to_lowercase().contains("expire") {
                    Self::ExpiredCoupon(message)
                } else {
                    Self::InvalidCoupon(message)
                }
            }
            ApiError::Unauthorized(message) | ApiError::Rejected { message, .. } => {
                Self::CouponLookupFailed(message)
            }
            err @ (ApiError::Http(_) | ApiError::Parse(_) | ApiError::Url(_)) => {
                Self::NetworkFailure(err)
            }
        }
    }

    /// Text to show the shopper: the server's message when there is one,
    /// a generic fallback otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCoupon(message)
            | Self::ExpiredCoupon(message)
            | Self::CouponLookupFailed(message)
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            Self::NetworkFailure(err) => err
                .server_message()
                .filter(|message| !message.trim().is_empty())
                .map_or_else(|| GENERIC_FAILURE.to_string(), str::to_string),
            Self::AuthRequired | Self::EmptyCart | Self::ProductUnavailable(_) => self.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Set the Sentry user context.
///
/// Call this after a successful sign-in to associate errors with the shopper.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the shopper.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "64f0c1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
