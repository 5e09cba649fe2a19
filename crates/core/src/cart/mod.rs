//! Shopping cart domain model.
//!
//! A cart is an ordered list of [`CartLineItem`]s plus values derived from
//! it. The derived values are never stored independently: every change to
//! the items goes through [`CartState::apply`], which calls [`recompute`].
//!
//! # Invariants
//!
//! - no two lines share a [`LineId`]
//! - every line has `quantity >= 1`
//! - `item_count` and `subtotal` equal [`recompute`] of the current items
//! - `final_total == subtotal - discount_amount`
//! - any change to the items drops the applied coupon and the coupon error

mod reducer;

pub use reducer::CartAction;

use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductSummary};
use crate::coupon::{AppliedCoupon, CouponCode, CouponSnapshot};
use crate::types::{LineId, Price, ProductId};

// =============================================================================
// Line Items
// =============================================================================

/// Optional variant selectors chosen when adding a product.
///
/// Two lines of the same product are the same line only if both selectors
/// are equal; `M` and no size at all are different variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "selectedSize", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "selectedColor", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Variant {
    /// A variant with both selectors.
    #[must_use]
    pub fn new(size: Option<String>, color: Option<String>) -> Self {
        Self { size, color }
    }

    /// A variant with only a size.
    #[must_use]
    pub fn sized(size: impl Into<String>) -> Self {
        Self {
            size: Some(size.into()),
            color: None,
        }
    }
}

/// Display data captured from the catalog when a product is added.
///
/// Snapshotted once; a later price change in the catalog does not touch
/// lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub unit_price: Price,
    pub image: Option<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            unit_price: product.price,
            image: product.image.clone(),
        }
    }
}

impl From<&ProductSummary> for ProductSnapshot {
    fn from(product: &ProductSummary) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            unit_price: product.price,
            image: product.image.clone(),
        }
    }
}

/// One distinct purchasable configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub line_id: LineId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub unit_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(flatten)]
    pub variant: Variant,
}

impl CartLineItem {
    /// Create a line for `quantity` units of a product snapshot.
    #[must_use]
    pub fn new(line_id: LineId, product: ProductSnapshot, variant: Variant, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            line_id,
            name: product.name,
            brand: product.brand,
            unit_price: product.unit_price,
            image: product.image,
            quantity,
            variant,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }

    /// Whether this line holds the given product in the given variant.
    #[must_use]
    pub fn is_same_configuration(&self, product_id: &ProductId, variant: &Variant) -> bool {
        &self.product_id == product_id && &self.variant == variant
    }
}

// =============================================================================
// Derived Totals
// =============================================================================

/// Values derived from the line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of quantities.
    pub item_count: u64,
    /// Sum of `unit_price * quantity`.
    pub subtotal: Price,
}

/// Compute the derived totals of a list of lines.
#[must_use]
pub fn recompute(items: &[CartLineItem]) -> Totals {
    Totals {
        item_count: items.iter().map(|item| u64::from(item.quantity)).sum(),
        subtotal: items.iter().map(CartLineItem::line_total).sum(),
    }
}

// =============================================================================
// Cart State
// =============================================================================

/// The cart aggregate.
///
/// Fields are private: read them through the getters and change them only
/// with [`CartState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<CartLineItem>,
    totals: Totals,
    coupon: Option<AppliedCoupon>,
    final_total: Price,
    coupon_error: Option<String>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.totals.item_count
    }

    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.totals.subtotal
    }

    /// Discount of the applied coupon, zero without one.
    #[must_use]
    pub fn discount_amount(&self) -> Price {
        self.coupon.as_ref().map_or(Price::ZERO, |c| c.discount)
    }

    #[must_use]
    pub fn applied_coupon_code(&self) -> Option<&CouponCode> {
        self.coupon.as_ref().map(|c| &c.code)
    }

    #[must_use]
    pub const fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    #[must_use]
    pub const fn final_total(&self) -> Price {
        self.final_total
    }

    /// Message of the last failed coupon application.
    #[must_use]
    pub fn coupon_error(&self) -> Option<&str> {
        self.coupon_error.as_deref()
    }

    /// Find a line by id.
    #[must_use]
    pub fn line(&self, line_id: &LineId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.line_id == line_id)
    }

    /// Find the line holding a product in a variant.
    #[must_use]
    pub fn find_configuration(
        &self,
        product_id: &ProductId,
        variant: &Variant,
    ) -> Option<&CartLineItem> {
        self.items
            .iter()
            .find(|item| item.is_same_configuration(product_id, variant))
    }

    /// The record persisted for the applied coupon, if any.
    #[must_use]
    pub fn coupon_snapshot(&self) -> Option<CouponSnapshot> {
        self.coupon.as_ref().map(|coupon| CouponSnapshot {
            code: coupon.code.clone(),
            discount: coupon.discount,
            final_total: self.final_total,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, product: &str, price: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(product),
            line_id: LineId::new(id),
            name: format!("Product {product}"),
            brand: "Acme".to_string(),
            unit_price: Price::from_units(price),
            image: None,
            quantity,
            variant: Variant::default(),
        }
    }

    #[test]
    fn test_recompute_empty() {
        assert_eq!(recompute(&[]), Totals::default());
    }

    #[test]
    fn test_recompute_sums_quantities_and_line_totals() {
        let totals = recompute(&[line("a", "p1", 500, 1), line("b", "p2", 250, 4)]);
        assert_eq!(totals.item_count, 5);
        assert_eq!(totals.subtotal, Price::from_units(1500));
    }

    #[test]
    fn test_line_item_wire_shape() {
        let mut item = line("l1", "p1", 500, 2);
        item.variant = Variant::sized("M");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["lineId"], "l1");
        assert_eq!(json["selectedSize"], "M");
        assert!(json.get("selectedColor").is_none());
        assert_eq!(json["quantity"], 2);
    }

    #[test]
    fn test_empty_state_totals_are_zero() {
        let state = CartState::new();
        assert_eq!(state.item_count(), 0);
        assert_eq!(state.subtotal(), Price::ZERO);
        assert_eq!(state.final_total(), Price::ZERO);
        assert_eq!(state.discount_amount(), Price::ZERO);
        assert!(state.coupon_snapshot().is_none());
    }
}
