//! Shopfront Core - Shared domain types.
//!
//! This crate provides the types used across all Shopfront components:
//! - `client` - REST gateway, local persistence, identity and the cart store
//! - `cli` - Terminal front end driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. The cart reducer lives here because it is a pure
//! state transition: every side effect (mirroring to the server, persisting
//! the guest cart) is the client's business.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Cart line items, derived totals, and the cart reducer
//! - [`coupon`] - Coupon codes, server quotes, and the persisted snapshot
//! - [`identity`] - The signed-in shopper
//! - [`catalog`] - Product listings and details
//! - [`order`] - Orders, order items, and shipping addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod identity;
pub mod order;
pub mod types;

pub use cart::{CartAction, CartLineItem, CartState, ProductSnapshot, Totals, Variant, recompute};
pub use catalog::{Product, ProductDetail, ProductSummary};
pub use coupon::{AppliedCoupon, CouponCode, CouponCodeError, CouponQuote, CouponSnapshot};
pub use identity::Identity;
pub use order::{NewOrder, Order, OrderItem, ShippingAddress};
pub use types::*;
