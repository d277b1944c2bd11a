//! Product feed extractor.
//!
//! Commerce storefronts expose their catalog as JSON at
//! `/products.json`. The decode is tolerant: prices arrive as strings
//! or numbers, tags as a comma-joined string or a list.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult, Product, Url};
use crate::ports::ProductExtractorPort;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);
const FEED_PAGE_SIZE: u32 = 250;

#[derive(Debug, Deserialize)]
struct ProductsFeed {
    #[serde(default)]
    products: Vec<FeedProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedProduct {
    #[serde(default)]
    handle: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default, deserialize_with = "de_tags")]
    tags: Vec<String>,
    #[serde(default)]
    variants: Vec<FeedVariant>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedVariant {
    #[serde(default, deserialize_with = "de_price")]
    price: Option<f64>,
    #[serde(default)]
    available: Option<bool>,
}

fn de_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    })
}

fn de_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    })
}

pub struct ProductFeedExtractor {
    client: Client,
}

impl ProductFeedExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn feed_url(store_url: &Url) -> String {
        format!("{}/products.json?limit={}", store_url.base(), FEED_PAGE_SIZE)
    }
}

#[async_trait]
impl ProductExtractorPort for ProductFeedExtractor {
    async fn is_supported(&self, store_url: &Url) -> DomainResult<bool> {
        let url = Self::feed_url(store_url);
        debug!(url = %url, "Probing product feed");

        let response = self
            .client
            .head(&url)
            .timeout(FEED_TIMEOUT)
            .send()
            .await
            .map_err(|e| DomainError::Scraping {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(response.status().is_success())
    }

    async fn extract_products(
        &self,
        page_id: &str,
        store_url: &Url,
    ) -> DomainResult<Vec<Product>> {
        let url = Self::feed_url(store_url);
        info!(page_id = %page_id, url = %url, "Extracting products from feed");

        let response = self
            .client
            .get(&url)
            .timeout(FEED_TIMEOUT)
            .send()
            .await
            .map_err(|e| DomainError::Scraping {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DomainError::Scraping {
                url: url.clone(),
                reason: format!("status {}", response.status()),
            });
        }

        let feed: ProductsFeed = response.json().await.map_err(|e| DomainError::Scraping {
            url: url.clone(),
            reason: format!("invalid product feed: {}", e),
        })?;

        let base = store_url.base();
        let products = feed
            .products
            .into_iter()
            .filter(|p| !p.handle.is_empty())
            .map(|p| feed_to_product(p, page_id, &base))
            .collect::<Vec<_>>();

        info!(page_id = %page_id, products = products.len(), "Products extracted");
        Ok(products)
    }
}

fn feed_to_product(feed: FeedProduct, page_id: &str, base: &str) -> Product {
    let mut product = Product::new(
        Uuid::new_v4().to_string(),
        page_id.to_string(),
        feed.handle.clone(),
        feed.title,
    );
    product.url = Some(format!("{}/products/{}", base, feed.handle));
    product.vendor = feed.vendor;
    product.tags = feed.tags;

    let prices: Vec<f64> = feed.variants.iter().filter_map(|v| v.price).collect();
    product.price_min = prices.iter().copied().fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |a| a.min(p)))
    });
    product.price_max = prices.iter().copied().fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |a| a.max(p)))
    });
    product.available = feed
        .variants
        .iter()
        .any(|v| v.available.unwrap_or(false))
        || feed.variants.is_empty();

    product
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_decodes_string_prices_and_comma_tags() {
        let feed: ProductsFeed = serde_json::from_str(
            r#"{"products":[{
                "handle":"led-lamp",
                "title":"LED Lamp",
                "vendor":"Glow",
                "tags":"lamp, led , home",
                "variants":[{"price":"19.99","available":true},{"price":29.99,"available":false}]
            }]}"#,
        )
        .unwrap();

        let product = feed_to_product(
            feed.products.into_iter().next().unwrap(),
            "p-1",
            "https://glowshop.com",
        );
        assert_eq!(product.handle, "led-lamp");
        assert_eq!(product.tags, vec!["lamp", "led", "home"]);
        assert_eq!(product.price_min, Some(19.99));
        assert_eq!(product.price_max, Some(29.99));
        assert!(product.available);
        assert_eq!(
            product.url.as_deref(),
            Some("https://glowshop.com/products/led-lamp")
        );
    }

    #[test]
    fn products_without_handles_are_dropped_later() {
        let feed: ProductsFeed =
            serde_json::from_str(r#"{"products":[{"title":"No handle"}]}"#).unwrap();
        assert_eq!(feed.products.len(), 1);
        assert!(feed.products[0].handle.is_empty());
    }

    #[test]
    fn feed_url_appends_page_size() {
        let url = Url::parse("https://glowshop.com/landing").unwrap();
        assert_eq!(
            ProductFeedExtractor::feed_url(&url),
            "https://glowshop.com/products.json?limit=250"
        );
    }
}
