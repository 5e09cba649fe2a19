//! Catalog browsing.

use shopfront_client::api::ApiClient;
use shopfront_core::{ProductId, ProductSummary};

use super::CommandError;

/// List products, optionally searched and filtered by category.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn list(
    api: &ApiClient,
    search: Option<&str>,
    category: Option<&str>,
) -> Result<(), CommandError> {
    let products = match (category, search) {
        (Some(category), query) => {
            api.search_in_category(category, query.unwrap_or_default())
                .await?
        }
        (None, Some(query)) => api.search(query).await?,
        (None, None) => api.list_products().await?,
    };

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }
    for product in &products {
        print_summary(product);
    }
    Ok(())
}

/// Show a product page.
///
/// # Errors
///
/// Returns an error if the product does not exist or the request fails.
pub async fn show(api: &ApiClient, id: &str) -> Result<(), CommandError> {
    let detail = api.product(&ProductId::new(id)).await?;
    let product = &detail.product;

    println!("{} ({})", product.name, product.brand);
    println!("  {}", product.price);
    if !product.category.is_empty() {
        println!("  Category: {}", product.category);
    }
    if !product.sizes.is_empty() {
        println!("  Sizes: {}", product.sizes.join(", "));
    }
    if product.is_purchasable() {
        println!("  In stock ({})", product.stock);
    } else {
        println!("  Out of stock");
    }
    if product.num_reviews > 0 {
        println!("  Rated {:.1} from {} reviews", product.rating, product.num_reviews);
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }

    if !detail.better_deals.is_empty() {
        println!();
        println!("Better deals:");
        for deal in &detail.better_deals {
            print_summary(deal);
        }
    }
    Ok(())
}

/// Print autocomplete suggestions.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn suggest(api: &ApiClient, query: &str) -> Result<(), CommandError> {
    for product in api.suggest(query).await? {
        println!("{}  {}", product.id, product.name);
    }
    Ok(())
}

fn print_summary(product: &ProductSummary) {
    println!(
        "{}  {:<40} {:>12}  {}",
        product.id, product.name, product.price.to_string(), product.brand
    );
}
