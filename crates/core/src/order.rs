//! Orders and shipping details.
//!
//! Payment is simulated: an order only records the label of the chosen
//! payment method.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartState;
use crate::types::{OrderId, OrderStatus, Price, ProductId, UserId};

/// Where an order is shipped. Every field is required by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Names of the fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("addressLine", &self.address_line),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("state", &self.state),
            ("country", &self.country),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// One line of an order, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub price: Price,
}

/// The body of an order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shipping_address: ShippingAddress,
    pub order_items: Vec<OrderItem>,
    pub total_price: Price,
    pub payment_method: String,
}

impl NewOrder {
    /// Build an order from the cart, charging its final (discounted) total.
    #[must_use]
    pub fn from_cart(
        cart: &CartState,
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            shipping_address,
            order_items: cart
                .items()
                .iter()
                .map(|item| OrderItem {
                    product: item.product_id.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    size: item.variant.size.clone(),
                    price: item.unit_price,
                })
                .collect(),
            total_price: cart.final_total(),
            payment_method: payment_method.into(),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Absent for guest orders.
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub guest: bool,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
