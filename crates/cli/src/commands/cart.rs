//! Cart and coupon commands.

use shopfront_core::{CartState, LineId, ProductId, ProductSnapshot, Variant};

use super::{CommandError, Shop};

/// Print the cart.
pub fn show(shop: &Shop) {
    print_cart(&shop.cart.snapshot());
}

/// Add one unit of a product, checking stock and size first.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched, is out of stock, or
/// does not come in `size`.
pub async fn add(shop: &mut Shop, product_id: &str, size: Option<String>) -> Result<(), CommandError> {
    let detail = shop.api.product(&ProductId::new(product_id)).await?;
    let product = &detail.product;

    if !product.is_purchasable() {
        return Err(CommandError::Invalid(format!("{} is out of stock.", product.name)));
    }
    // Match the catalog's spelling of the size so lines merge.
    let size = match size {
        Some(size) => Some(
            product
                .sizes
                .iter()
                .find(|offered| offered.eq_ignore_ascii_case(&size))
                .cloned()
                .ok_or_else(|| {
                    CommandError::Invalid(format!(
                        "{} does not come in size {size}. Sizes: {}",
                        product.name,
                        product.sizes.join(", ")
                    ))
                })?,
        ),
        None if !product.sizes.is_empty() => {
            return Err(CommandError::Invalid(format!(
                "Choose a size with --size: {}",
                product.sizes.join(", ")
            )));
        }
        None => None,
    };

    shop.cart
        .add_item(ProductSnapshot::from(product), Variant::new(size, None))
        .await;
    print_cart(&shop.cart.snapshot());
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if no line matches.
pub async fn remove(shop: &mut Shop, line: &str) -> Result<(), CommandError> {
    let line_id = resolve_line(&shop.cart.snapshot(), line)?;
    shop.cart.remove_item(&line_id).await;
    print_cart(&shop.cart.snapshot());
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if no line matches.
pub async fn update(shop: &mut Shop, line: &str, quantity: i64) -> Result<(), CommandError> {
    let line_id = resolve_line(&shop.cart.snapshot(), line)?;
    shop.cart.update_quantity(&line_id, quantity).await;
    print_cart(&shop.cart.snapshot());
    Ok(())
}

pub async fn clear(shop: &mut Shop) {
    shop.cart.clear().await;
    println!("Cart cleared.");
}

/// Apply a coupon code.
///
/// # Errors
///
/// Returns the coupon failure, worded for the shopper.
pub async fn apply_coupon(shop: &mut Shop, code: &str) -> Result<(), CommandError> {
    let coupon = shop.cart.apply_coupon(code).await?;
    println!("Coupon {} applied: you save {}.", coupon.code, coupon.discount);
    print_cart(&shop.cart.snapshot());
    Ok(())
}

pub fn remove_coupon(shop: &mut Shop) {
    shop.cart.remove_coupon();
    print_cart(&shop.cart.snapshot());
}

/// Find a line by 1-based position or by line id.
fn resolve_line(state: &CartState, line: &str) -> Result<LineId, CommandError> {
    let by_position = line
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| state.items().get(index));
    by_position
        .or_else(|| state.line(&LineId::new(line)))
        .map(|item| item.line_id.clone())
        .ok_or_else(|| CommandError::Invalid(format!("No cart line {line}.")))
}

pub fn print_cart(state: &CartState) {
    if state.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for (position, item) in state.items().iter().enumerate() {
        let size = item
            .variant
            .size
            .as_deref()
            .map(|size| format!(" ({size})"))
            .unwrap_or_default();
        println!(
            "{:>2}. {}{size}  x{}  {}  [{}]",
            position + 1,
            item.name,
            item.quantity,
            item.line_total(),
            item.line_id
        );
    }
    println!();
    println!("Items:    {}", state.item_count());
    println!("Subtotal: {}", state.subtotal());
    if let Some(coupon) = state.applied_coupon() {
        println!("Discount: -{} ({})", coupon.discount, coupon.code);
    }
    println!("Total:    {}", state.final_total());
    if let Some(error) = state.coupon_error() {
        println!("Coupon:   {error}");
    }
}
