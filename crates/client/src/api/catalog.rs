//! Catalog reads. Listings and product pages are cached; search is not.

use reqwest::Method;
use tracing::{debug, instrument};

use shopfront_core::{ProductDetail, ProductId, ProductSummary};

use super::cache::{CacheValue, product_key, products_key};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductSummary>, ApiError> {
        let cache_key = products_key();

        // Check cache
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = self.endpoint(&["products"])?;
        let products: Vec<ProductSummary> =
            self.execute(self.request(Method::GET, url, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// A product page: the product and cheaper alternatives in its category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<ProductDetail, ApiError> {
        let cache_key = product_key(id);

        if let Some(CacheValue::Product(detail)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*detail);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let detail: ProductDetail = self.execute(self.request(Method::GET, url, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(detail.clone())))
            .await;

        Ok(detail)
    }

    /// Full-text search, ranked by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let mut url = self.endpoint(&["products", "search"])?;
        url.query_pairs_mut().append_pair("q", query);
        self.execute(self.request(Method::GET, url, None)).await
    }

    /// Search within one category. An empty query lists the whole category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_in_category(
        &self,
        category: &str,
        query: &str,
    ) -> Result<Vec<ProductSummary>, ApiError> {
        let mut url = self.endpoint(&["products", "category", category])?;
        if !query.trim().is_empty() {
            url.query_pairs_mut().append_pair("q", query);
        }
        self.execute(self.request(Method::GET, url, None)).await
    }

    /// Type-ahead suggestions for a partial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let mut url = self.endpoint(&["products", "suggest"])?;
        url.query_pairs_mut().append_pair("q", query);
        self.execute(self.request(Method::GET, url, None)).await
    }

    /// Drop every cached catalog response.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
