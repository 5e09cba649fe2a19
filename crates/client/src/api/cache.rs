//! Cache types for catalog responses.

use shopfront_core::{ProductDetail, ProductId, ProductSummary};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<ProductSummary>),
    Product(Box<ProductDetail>),
}

/// Key of the full product listing.
pub fn products_key() -> String {
    "products".to_string()
}

/// Key of one product page.
pub fn product_key(id: &ProductId) -> String {
    format!("product:{id}")
}
