//! Remote cart gateway: the server side of an authenticated cart.

use std::future::Future;

use reqwest::Method;
use tracing::{debug, instrument};

use shopfront_core::{CartLineItem, CouponCode, CouponQuote, LineId, Price, ProductId};

use super::conversions::convert_cart;
use super::wire::{AddToCartBody, ApplyCouponBody, ServerCart};
use super::{ApiClient, ApiError, BearerToken};
use crate::error::CartError;

/// Identity of one server cart line, whether or not its product was populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: u32,
}

/// A server cart, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCart {
    /// Lines whose product snapshot came along, ready to load.
    pub items: Vec<CartLineItem>,
    /// Every surviving line, including ones that only carried a product id.
    pub lines: Vec<RemoteLine>,
    /// Lines dropped because their product no longer exists.
    pub unavailable: Vec<LineId>,
}

impl RemoteCart {
    /// A cart made of fully populated lines.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let lines = items
            .iter()
            .map(|item| RemoteLine {
                line_id: item.line_id.clone(),
                product_id: item.product_id.clone(),
                size: item.variant.size.clone(),
                quantity: item.quantity,
            })
            .collect();
        Self {
            items,
            lines,
            unavailable: Vec::new(),
        }
    }

    /// The server's id for the line holding `product_id` in `size`.
    #[must_use]
    pub fn line_id_for(&self, product_id: &ProductId, size: Option<&str>) -> Option<&LineId> {
        self.lines
            .iter()
            .find(|line| &line.product_id == product_id && line.size.as_deref() == size)
            .map(|line| &line.line_id)
    }
}

/// The server-side cart contract.
///
/// Every call needs the shopper's token; a guest has no server cart.
pub trait CartGateway: Send + Sync {
    /// The current server cart. A shopper without one has an empty cart.
    fn fetch_cart(
        &self,
        token: &BearerToken,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// Add `quantity` units of a product, incrementing the line with the
    /// same product and size if the server has one.
    fn add_item(
        &self,
        token: &BearerToken,
        product_id: &ProductId,
        quantity: u32,
        size: Option<&str>,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// Delete a line. Deleting a line the server does not have succeeds.
    fn remove_item(
        &self,
        token: &BearerToken,
        line_id: &LineId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Empty the server cart.
    fn clear(&self, token: &BearerToken) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Price a coupon against `subtotal`. The discount is always computed
    /// by the server.
    fn apply_coupon(
        &self,
        token: &BearerToken,
        code: &CouponCode,
        subtotal: Price,
    ) -> impl Future<Output = Result<CouponQuote, CartError>> + Send;
}

impl CartGateway for ApiClient {
    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &BearerToken) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        match self
            .execute::<ServerCart>(self.request(Method::GET, url, Some(token)))
            .await
        {
            Ok(cart) => Ok(convert_cart(cart)),
            Err(ApiError::NotFound(_)) => {
                debug!("No server cart yet");
                Ok(RemoteCart::default())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn add_item(
        &self,
        token: &BearerToken,
        product_id: &ProductId,
        quantity: u32,
        size: Option<&str>,
    ) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        let body = AddToCartBody {
            product_id,
            quantity,
            size,
        };
        let cart: ServerCart = self
            .execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await?;
        Ok(convert_cart(cart))
    }

    #[instrument(skip(self, token), fields(line_id = %line_id))]
    async fn remove_item(&self, token: &BearerToken, line_id: &LineId) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", line_id.as_str()])?;
        match self.send(self.request(Method::DELETE, url, Some(token))).await {
            Ok(_) => Ok(()),
            Err(ApiError::NotFound(_)) => {
                debug!("Line already gone from server cart");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, token))]
    async fn clear(&self, token: &BearerToken) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart"])?;
        self.send(self.request(Method::DELETE, url, Some(token)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(code = %code, subtotal = %subtotal))]
    async fn apply_coupon(
        &self,
        token: &BearerToken,
        code: &CouponCode,
        subtotal: Price,
    ) -> Result<CouponQuote, CartError> {
        let url = self.endpoint(&["coupons", "apply"])?;
        let body = ApplyCouponBody {
            code,
            cart_total: subtotal,
        };
        self.execute(self.request(Method::POST, url, Some(token)).json(&body))
            .await
            .map_err(CartError::from_coupon_rejection)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::{ProductSnapshot, Variant};

    #[test]
    fn test_line_id_for_matches_size_exactly() {
        let snapshot = ProductSnapshot {
            product_id: ProductId::new("p1"),
            name: "Tee".into(),
            brand: "Acme".into(),
            unit_price: Price::from_units(300),
            image: None,
        };
        let remote = RemoteCart::from_items(vec![
            CartLineItem::new(LineId::new("a"), snapshot.clone(), Variant::default(), 1),
            CartLineItem::new(LineId::new("b"), snapshot, Variant::sized("M"), 1),
        ]);
        let p1 = ProductId::new("p1");
        assert_eq!(remote.line_id_for(&p1, None), Some(&LineId::new("a")));
        assert_eq!(remote.line_id_for(&p1, Some("M")), Some(&LineId::new("b")));
        assert_eq!(remote.line_id_for(&p1, Some("L")), None);
    }
}
