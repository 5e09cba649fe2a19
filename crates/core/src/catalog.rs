//! Catalog types as served by the products endpoints.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

const fn available_by_default() -> bool {
    true
}

/// A full catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: u32,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

impl Product {
    /// Whether the product can be put in a cart right now.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_available && self.stock > 0
    }

    /// Whether `size` is one of the offered sizes. Products without sizes
    /// accept no size selector.
    #[must_use]
    pub fn offers_size(&self, size: Option<&str>) -> bool {
        match size {
            None => true,
            Some(size) => self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size)),
        }
    }
}

/// A product as it appears in listings, search results and deal suggestions.
///
/// Listings project only a subset of fields, so everything beyond the
/// basics is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: Option<u32>,
    /// Relevance score; only present in search results.
    #[serde(default)]
    pub score: Option<f64>,
}

/// A product page: the product plus cheaper alternatives in its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: Product,
    #[serde(default)]
    pub better_deals: Vec<ProductSummary>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_backend_json() {
        let json = r#"{
            "product": {
                "_id": "p1", "name": "Runner", "description": "Light shoe",
                "category": "Shoes", "brand": "Stride", "price": 2499,
                "stock": 3, "sizes": ["8", "9"], "image": "/img/runner.png",
                "rating": 4.5, "numReviews": 12, "isAvailable": true,
                "createdAt": "2024-05-01T10:00:00.000Z"
            },
            "betterDeals": [
                { "_id": "p2", "name": "Jogger", "price": 1999, "brand": "Stride", "category": "Shoes" }
            ]
        }"#;
        let detail: ProductDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.product.price, Price::from_units(2499));
        assert!(detail.product.is_purchasable());
        assert!(detail.product.offers_size(Some("9")));
        assert!(!detail.product.offers_size(Some("11")));
        assert_eq!(detail.better_deals.len(), 1);
        assert!(detail.better_deals[0].image.is_none());
    }

    #[test]
    fn test_out_of_stock_is_not_purchasable() {
        let product: Product =
            serde_json::from_str(r#"{"_id":"p","name":"n","price":1,"stock":0}"#).unwrap();
        assert!(!product.is_purchasable());
    }
}
