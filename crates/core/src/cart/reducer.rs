//! The cart reducer.
//!
//! Every change to a [`CartState`] is expressed as a [`CartAction`] and
//! applied with [`CartState::apply`]. The reducer is pure: it knows nothing
//! about the server, local storage or who is signed in.

use std::collections::HashSet;
use std::num::NonZeroU32;

use super::{CartLineItem, CartState, recompute};
use crate::coupon::{AppliedCoupon, CouponSnapshot};
use crate::types::LineId;

/// A state transition of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Replace every line (startup, after a merge, after a logout).
    Load(Vec<CartLineItem>),
    /// Add a line, or add its quantity to the line with the same product
    /// and variant.
    AddItem(CartLineItem),
    /// Delete a line. Unknown ids are ignored.
    RemoveItem(LineId),
    /// Set the quantity of a line. Unknown ids are ignored.
    SetQuantity {
        line_id: LineId,
        quantity: NonZeroU32,
    },
    /// Replace a temporary line id with the one the server assigned.
    AdoptLineId { from: LineId, to: LineId },
    /// Remove every line.
    Clear,
    /// A coupon was accepted by the pricing endpoint.
    CouponApplied(AppliedCoupon),
    /// A coupon application failed with a user-facing message.
    CouponFailed(String),
    /// Forget the last coupon error (a new attempt is starting).
    ClearCouponError,
    /// Bring back a coupon persisted in an earlier session.
    RestoreCoupon(CouponSnapshot),
    /// Drop the applied coupon without touching the items.
    RemoveCoupon,
}

impl CartState {
    /// Apply an action. Returns `false` when the action left the state
    /// untouched (unknown line, rejected coupon, ...).
    pub fn apply(&mut self, action: CartAction) -> bool {
        match action {
            CartAction::Load(items) => {
                self.items = sanitize(items);
                self.items_changed();
                true
            }
            CartAction::AddItem(item) => self.add_item(item),
            CartAction::RemoveItem(line_id) => {
                let before = self.items.len();
                self.items.retain(|item| item.line_id != line_id);
                if self.items.len() == before {
                    return false;
                }
                self.items_changed();
                true
            }
            CartAction::SetQuantity { line_id, quantity } => {
                let Some(item) = self.items.iter_mut().find(|item| item.line_id == line_id)
                else {
                    return false;
                };
                item.quantity = quantity.get();
                self.items_changed();
                true
            }
            CartAction::AdoptLineId { from, to } => self.adopt_line_id(&from, to),
            CartAction::Clear => {
                self.items.clear();
                self.items_changed();
                true
            }
            CartAction::CouponApplied(coupon) => self.set_coupon(coupon),
            CartAction::CouponFailed(message) => {
                self.coupon_error = Some(message);
                true
            }
            CartAction::ClearCouponError => self.coupon_error.take().is_some(),
            CartAction::RestoreCoupon(snapshot) => {
                // A snapshot from an earlier session only fits if it was
                // computed against the subtotal we have now.
                if snapshot.discount + snapshot.final_total != self.totals.subtotal {
                    return false;
                }
                self.set_coupon(AppliedCoupon {
                    code: snapshot.code,
                    discount: snapshot.discount,
                })
            }
            CartAction::RemoveCoupon => {
                let changed = self.coupon.is_some() || self.coupon_error.is_some();
                self.coupon = None;
                self.coupon_error = None;
                self.final_total = self.totals.subtotal;
                changed
            }
        }
    }

    fn add_item(&mut self, item: CartLineItem) -> bool {
        if item.quantity == 0 {
            return false;
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.is_same_configuration(&item.product_id, &item.variant))
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else if self.line(&item.line_id).is_some() {
            // Same id, different configuration: appending would break id uniqueness.
            return false;
        } else {
            self.items.push(item);
        }

        self.items_changed();
        true
    }

    fn adopt_line_id(&mut self, from: &LineId, to: LineId) -> bool {
        if from == &to || self.line(&to).is_some() {
            return false;
        }
        let Some(item) = self.items.iter_mut().find(|item| &item.line_id == from) else {
            return false;
        };
        item.line_id = to;
        true
    }

    fn set_coupon(&mut self, coupon: AppliedCoupon) -> bool {
        let subtotal = self.totals.subtotal;
        if self.items.is_empty() || coupon.discount.is_negative() || coupon.discount > subtotal {
            return false;
        }
        self.final_total = subtotal - coupon.discount;
        self.coupon = Some(coupon);
        self.coupon_error = None;
        true
    }

    /// Recompute derived values and invalidate the coupon.
    fn items_changed(&mut self) {
        self.totals = recompute(&self.items);
        self.coupon = None;
        self.coupon_error = None;
        self.final_total = self.totals.subtotal;
    }
}

/// Drop zero-quantity lines and repeated line ids from loaded data.
fn sanitize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| item.quantity > 0 && seen.insert(item.line_id.clone()))
        .collect()
}
