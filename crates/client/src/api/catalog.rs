//! Catalog endpoints (read-only, cached).
//!
//! Products and product pages are cached for 5 minutes; search results are
//! never cached. Carts and credentials never pass through this cache.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sandpiper_core::{Price, ProductId, VariantId};

use crate::cart::ProductSnapshot;

use super::{ApiClient, ApiError};

/// A catalog product as delivered by the products endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Capture the denormalized snapshot the cart engine stores.
    ///
    /// When a variant is selected its price and stock win over the
    /// product-level values.
    #[must_use]
    pub fn snapshot(&self, variant_id: Option<&VariantId>) -> ProductSnapshot {
        let variant = variant_id
            .and_then(|id| self.variants.iter().find(|variant| variant.id == *id));

        let (price, stock) = variant
            .map_or((self.price, self.stock), |variant| {
                (variant.price, variant.stock)
            });

        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: Price::usd(price),
            image: self.images.first().cloned(),
            stock,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductPage {
    #[serde(rename = "data")]
    pub items: Vec<Product>,
    pub pagination: PageInfo,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

/// Values held by the catalog cache.
#[derive(Clone)]
pub(crate) enum CatalogCacheValue {
    Product(Box<Product>),
    Page(ProductPage),
}

impl ApiClient {
    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Remote` with status 404 if the product does not
    /// exist, or any other pipeline error.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = format!("product:{slug}");

        if let Some(CatalogCacheValue::Product(product)) =
            self.catalog_cache().get(&cache_key).await
        {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get(&format!("/products/{slug}")).await?;

        self.catalog_cache()
            .insert(
                cache_key,
                CatalogCacheValue::Product(Box::new(product.clone())),
            )
            .await;

        Ok(product)
    }

    /// Get a paginated list of products.
    ///
    /// Pages without a search query are cached; searches always go to the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        page: Option<u32>,
        search: Option<&str>,
    ) -> Result<ProductPage, ApiError> {
        let cache_key = format!("products:{}", page.unwrap_or(1));

        if search.is_none()
            && let Some(CatalogCacheValue::Page(cached)) =
                self.catalog_cache().get(&cache_key).await
        {
            debug!("cache hit for product page");
            return Ok(cached);
        }

        let mut path = format!("/products?page={}", page.unwrap_or(1));
        if let Some(query) = search {
            path.push_str("&search=");
            path.push_str(&urlencode(query));
        }

        let result: ProductPage = self.get(&path).await?;

        if search.is_none() {
            self.catalog_cache()
                .insert(cache_key, CatalogCacheValue::Page(result.clone()))
                .await;
        }

        Ok(result)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_catalog(&self) {
        self.catalog_cache().invalidate_all();
        self.catalog_cache().run_pending_tasks().await;
    }
}

/// Percent-encode a query value.
fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Desk Lamp".to_string(),
            slug: "desk-lamp".to_string(),
            description: String::new(),
            price: dec("49.00"),
            compare_at_price: None,
            images: vec!["https://cdn.example/lamp.jpg".to_string()],
            stock: 12,
            variants: vec![ProductVariant {
                id: VariantId::new("v1"),
                name: "Walnut".to_string(),
                price: dec("59.00"),
                stock: 3,
            }],
        }
    }

    #[test]
    fn test_snapshot_uses_product_price_without_variant() {
        let snapshot = product().snapshot(None);
        assert_eq!(snapshot.price.amount, dec("49.00"));
        assert_eq!(snapshot.stock, 12);
        assert_eq!(snapshot.image.as_deref(), Some("https://cdn.example/lamp.jpg"));
    }

    #[test]
    fn test_snapshot_prefers_selected_variant() {
        let variant = VariantId::new("v1");
        let snapshot = product().snapshot(Some(&variant));
        assert_eq!(snapshot.price.amount, dec("59.00"));
        assert_eq!(snapshot.stock, 3);
    }

    #[test]
    fn test_snapshot_ignores_unknown_variant() {
        let variant = VariantId::new("missing");
        let snapshot = product().snapshot(Some(&variant));
        assert_eq!(snapshot.price.amount, dec("49.00"));
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("desk lamp"), "desk%20lamp");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("plain-text_1.0~"), "plain-text_1.0~");
    }

    #[test]
    fn test_product_page_wire_shape() {
        let raw = r#"{
            "data": [{"id":"p1","name":"Lamp","slug":"lamp","price":"10.00"}],
            "pagination": {"page":1,"limit":20,"total":1,"pages":1}
        }"#;
        let page: ProductPage = serde_json::from_str(raw).expect("parse");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].price, dec("10.00"));
    }
}
