//! Checkout: turning the cart into an order.
//!
//! Payment is simulated. The order carries a payment method label and
//! nothing is charged.

use std::future::Future;

use thiserror::Error;
use tracing::{info, instrument, warn};

use shopfront_core::{NewOrder, Order, ShippingAddress};

use crate::api::{ApiClient, ApiError, BearerToken, CartGateway};
use crate::cart::CartStore;
use crate::error::add_breadcrumb;
use crate::storage::Storage;

/// Country preselected on a fresh shipping form.
pub const DEFAULT_COUNTRY: &str = "India";

/// Label recorded as the payment method of every order.
pub const PLACEHOLDER_PAYMENT: &str = "Placeholder";

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The server refused the order; the message is meant for the shopper.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to place order: {0}")]
    Api(ApiError),
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => {
                Self::Rejected(message)
            }
            err => Self::Api(err),
        }
    }
}

/// Where orders are sent.
pub trait OrderGateway: Send + Sync {
    /// Create an order. Without a token it is a guest order.
    fn submit_order(
        &self,
        token: Option<&BearerToken>,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

impl OrderGateway for ApiClient {
    async fn submit_order(
        &self,
        token: Option<&BearerToken>,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        self.place_order(token, order).await
    }
}

/// Places orders for the contents of a cart.
pub struct Checkout<O> {
    orders: O,
}

impl<O: OrderGateway> Checkout<O> {
    #[must_use]
    pub const fn new(orders: O) -> Self {
        Self { orders }
    }

    /// The shipping form to start from.
    ///
    /// A signed-in shopper gets their name filled in. A guest gets whatever
    /// they entered last time, if anything.
    #[must_use]
    pub fn draft_address<G: CartGateway, S: Storage>(&self, cart: &CartStore<G, S>) -> ShippingAddress {
        let blank = ShippingAddress {
            country: DEFAULT_COUNTRY.to_string(),
            ..ShippingAddress::default()
        };
        match cart.session() {
            Some(session) => ShippingAddress {
                full_name: session.identity.name.clone(),
                ..blank
            },
            None => cart.local().guest_shipping().unwrap_or(blank),
        }
    }

    /// Remember a guest's shipping details. Does nothing when signed in.
    pub fn save_draft<G: CartGateway, S: Storage>(
        &self,
        cart: &CartStore<G, S>,
        address: &ShippingAddress,
    ) {
        if cart.session().is_none()
            && let Err(e) = cart.local().save_guest_shipping(address)
        {
            warn!(error = %e, "Failed to remember shipping details");
        }
    }

    /// Order everything in the cart at its final (discounted) total.
    ///
    /// On success the cart is emptied and a guest's saved shipping details
    /// are forgotten. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::MissingFields`
    /// before contacting the server, or the server's refusal.
    #[instrument(skip_all, fields(guest = cart.session().is_none()))]
    pub async fn place_order<G: CartGateway, S: Storage>(
        &self,
        cart: &mut CartStore<G, S>,
        shipping: ShippingAddress,
        payment_method: &str,
    ) -> Result<Order, CheckoutError> {
        let state = cart.snapshot();
        if state.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let missing = shipping.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }

        self.save_draft(cart, &shipping);
        let order = NewOrder::from_cart(&state, shipping, payment_method);
        let token = cart.session().map(|session| session.token.clone());

        let placed = self.orders.submit_order(token.as_ref(), &order).await?;
        info!(order_id = %placed.id, total = %placed.total_price, "Checkout complete");
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", placed.id.as_str())]));

        cart.clear().await;
        if token.is_none()
            && let Err(e) = cart.local().clear_guest_shipping()
        {
            warn!(error = %e, "Failed to forget shipping details");
        }
        Ok(placed)
    }
}
