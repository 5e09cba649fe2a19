//! Order placement, history and cancellation.

use reqwest::Method;
use tracing::{info, instrument};

use shopfront_core::{NewOrder, Order, OrderId};

use super::{ApiClient, ApiError, BearerToken};

impl ApiClient {
    /// Place an order. Without a token the order is a guest order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the server rejects the
    /// order.
    #[instrument(skip(self, token, order), fields(items = order.order_items.len(), guest = token.is_none()))]
    pub async fn place_order(
        &self,
        token: Option<&BearerToken>,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let order: Order = self
            .execute(self.request(Method::POST, url, token).json(order))
            .await?;
        info!(order_id = %order.id, total = %order.total_price, "Order placed");
        Ok(order)
    }

    /// The signed-in shopper's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for a bad token, or an error if the
    /// API request fails.
    #[instrument(skip(self, token))]
    pub async fn order_history(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["orders", "history"])?;
        self.execute(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist or is
    /// already cancelled, or an error if the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn cancel_order(&self, token: &BearerToken, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", id.as_str(), "cancel"])?;
        let order: Order = self
            .execute(self.request(Method::PUT, url, Some(token)))
            .await?;
        info!(status = %order.status, "Order cancelled");
        Ok(order)
    }
}
