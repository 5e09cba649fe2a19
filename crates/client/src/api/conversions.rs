//! Conversions from server shapes to canonical cart types.

use tracing::warn;

use shopfront_core::{CartLineItem, ProductSnapshot, Variant};

use super::cart::{RemoteCart, RemoteLine};
use super::wire::{ProductRef, ServerCart, ServerCartLine};
use crate::error::CartError;

/// Normalize a server cart.
///
/// Lines with a populated product become [`CartLineItem`]s. Lines whose
/// product is only an id keep their identity (so the caller can adopt the
/// server line id) but produce no item. Lines whose product is gone are
/// dropped and reported in [`RemoteCart::unavailable`]. Non-positive
/// quantities are dropped too.
pub fn convert_cart(cart: ServerCart) -> RemoteCart {
    let mut remote = RemoteCart::default();

    for line in cart.items {
        let ServerCartLine {
            id,
            product,
            quantity,
            size,
        } = line;

        let quantity = match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => quantity,
            _ => {
                warn!(line_id = %id, quantity, "Dropping cart line with invalid quantity");
                continue;
            }
        };

        match product {
            Some(ProductRef::Populated(product)) => {
                remote.lines.push(RemoteLine {
                    line_id: id.clone(),
                    product_id: product.id.clone(),
                    size: size.clone(),
                    quantity,
                });
                remote.items.push(CartLineItem::new(
                    id,
                    ProductSnapshot {
                        product_id: product.id,
                        name: product.name,
                        brand: product.brand,
                        unit_price: product.price,
                        image: product.image,
                    },
                    // The server cart has no color selector.
                    Variant::new(size, None),
                    quantity,
                ));
            }
            Some(ProductRef::Id(product_id)) => remote.lines.push(RemoteLine {
                line_id: id,
                product_id,
                size,
                quantity,
            }),
            None => {
                warn!(
                    error = %CartError::ProductUnavailable(id.clone()),
                    "Filtering out cart line"
                );
                remote.unavailable.push(id);
            }
        }
    }

    remote
}
