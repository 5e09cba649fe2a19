//! Order commands.

use clap::Args;

use shopfront_client::api::BearerToken;
use shopfront_client::checkout::{Checkout, PLACEHOLDER_PAYMENT};
use shopfront_core::{Order, OrderId, ShippingAddress};

use super::cart::print_cart;
use super::{CommandError, Shop};

/// Shipping details for `orders place`. Omitted fields come from the saved
/// draft (guests) or the account name (signed in).
#[derive(Args)]
pub struct PlaceArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    postal_code: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Payment method label; nothing is charged
    #[arg(long, default_value = PLACEHOLDER_PAYMENT)]
    payment: String,
}

impl PlaceArgs {
    fn fill(self, draft: ShippingAddress) -> (ShippingAddress, String) {
        let address = ShippingAddress {
            full_name: self.full_name.unwrap_or(draft.full_name),
            address_line: self.address.unwrap_or(draft.address_line),
            city: self.city.unwrap_or(draft.city),
            postal_code: self.postal_code.unwrap_or(draft.postal_code),
            state: self.state.unwrap_or(draft.state),
            country: self.country.unwrap_or(draft.country),
            phone: self.phone.unwrap_or(draft.phone),
        };
        (address, self.payment)
    }
}

/// Order the cart contents.
///
/// A guest's shipping details are kept between attempts, so a failed
/// order can be retried with only the missing fields.
///
/// # Errors
///
/// Returns an error for an empty cart, missing shipping fields, or a
/// refused order.
pub async fn place(shop: &mut Shop, args: PlaceArgs) -> Result<(), CommandError> {
    let checkout = Checkout::new(shop.api.clone());
    let (address, payment) = args.fill(checkout.draft_address(&shop.cart));
    checkout.save_draft(&shop.cart, &address);

    print_cart(&shop.cart.snapshot());
    let order = checkout.place_order(&mut shop.cart, address, &payment).await?;

    println!();
    println!("Order placed! Thank you for your purchase.");
    print_order(&order);
    Ok(())
}

/// List the signed-in shopper's orders.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for a guest, or an error if the
/// request fails.
pub async fn history(shop: &Shop) -> Result<(), CommandError> {
    let orders = shop.api.order_history(&token(shop)?).await?;
    if orders.is_empty() {
        println!("No orders yet.");
    }
    for order in &orders {
        print_order(order);
    }
    Ok(())
}

/// Cancel an order.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for a guest, or the server's refusal
/// for an unknown or already cancelled order.
pub async fn cancel(shop: &Shop, id: &str) -> Result<(), CommandError> {
    let order = shop
        .api
        .cancel_order(&token(shop)?, &OrderId::new(id))
        .await?;
    println!("Order {} is now {}.", order.id, order.status);
    Ok(())
}

fn token(shop: &Shop) -> Result<BearerToken, CommandError> {
    shop.identity
        .current()
        .session()
        .map(|session| session.token.clone())
        .ok_or(CommandError::NotSignedIn)
}

fn print_order(order: &Order) {
    let placed = order
        .created_at
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!(
        "{}  {placed}  {:<10}  {}",
        order.id, order.status.to_string(), order.total_price
    );
    for item in &order.order_items {
        let size = item
            .size
            .as_deref()
            .map(|size| format!(" ({size})"))
            .unwrap_or_default();
        println!("    {}{size} x{}  {}", item.name, item.quantity, item.price);
    }
}
