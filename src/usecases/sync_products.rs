//! Product catalog sync use case.
//!
//! Pulls the product feed of a verified commerce storefront and
//! upserts the rows keyed on (page_id, handle).

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{DomainError, DomainResult};
use crate::ports::{PageRepository, ProductExtractorPort, ProductRepository};

#[derive(Debug, Clone)]
pub struct SyncProductsResult {
    pub page_id: String,
    pub products_synced: u32,
    pub products_extracted: u32,
    pub is_commerce: bool,
    pub skipped_reason: Option<String>,
}

pub struct SyncProductsForPageUseCase {
    pages: Arc<dyn PageRepository>,
    products: Arc<dyn ProductRepository>,
    extractor: Arc<dyn ProductExtractorPort>,
}

impl SyncProductsForPageUseCase {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        products: Arc<dyn ProductRepository>,
        extractor: Arc<dyn ProductExtractorPort>,
    ) -> Self {
        Self {
            pages,
            products,
            extractor,
        }
    }

    pub async fn execute(&self, page_id: &str) -> DomainResult<SyncProductsResult> {
        info!(page_id = %page_id, "Starting product sync");

        let page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        if !page.is_commerce_platform {
            info!(page_id = %page_id, domain = %page.domain, "Page is not a commerce store, skipping sync");
            return Ok(SyncProductsResult {
                page_id: page_id.to_string(),
                products_synced: 0,
                products_extracted: 0,
                is_commerce: false,
                skipped_reason: Some("page is not a commerce store".into()),
            });
        }

        if !self.extractor.is_supported(&page.url).await? {
            warn!(page_id = %page_id, url = %page.url, "Product feed not accessible");
            return Ok(SyncProductsResult {
                page_id: page_id.to_string(),
                products_synced: 0,
                products_extracted: 0,
                is_commerce: true,
                skipped_reason: Some("product feed not accessible".into()),
            });
        }

        let extracted = self
            .extractor
            .extract_products(page_id, &page.url)
            .await?;
        let products_extracted = extracted.len() as u32;

        if !extracted.is_empty() {
            self.products.save_many(&extracted).await?;
        }

        info!(
            page_id = %page_id,
            products_extracted,
            "Product sync completed"
        );

        Ok(SyncProductsResult {
            page_id: page_id.to_string(),
            products_synced: products_extracted,
            products_extracted,
            is_commerce: true,
            skipped_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Product, Url};
    use crate::usecases::fakes::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct StubExtractor {
        supported: Mutex<bool>,
        products: Mutex<Vec<Product>>,
    }

    #[async_trait]
    impl ProductExtractorPort for StubExtractor {
        async fn is_supported(&self, _store_url: &Url) -> DomainResult<bool> {
            Ok(*self.supported.lock())
        }

        async fn extract_products(
            &self,
            _page_id: &str,
            _store_url: &Url,
        ) -> DomainResult<Vec<Product>> {
            Ok(self.products.lock().clone())
        }
    }

    fn commerce_page() -> crate::domain::Page {
        let mut page = sample_page("p-1", "adv-1");
        page.begin_analysis().unwrap();
        page.mark_as_commerce("profile".into()).unwrap();
        page
    }

    #[tokio::test]
    async fn non_commerce_pages_are_skipped() {
        let use_case = SyncProductsForPageUseCase::new(
            Arc::new(InMemoryPages::with(sample_page("p-1", "adv-1"))),
            Arc::new(InMemoryProducts::default()),
            Arc::new(StubExtractor::default()),
        );

        let result = use_case.execute("p-1").await.unwrap();
        assert!(!result.is_commerce);
        assert_eq!(result.products_synced, 0);
        assert!(result.skipped_reason.is_some());
    }

    #[tokio::test]
    async fn unsupported_feed_is_a_soft_skip() {
        let use_case = SyncProductsForPageUseCase::new(
            Arc::new(InMemoryPages::with(commerce_page())),
            Arc::new(InMemoryProducts::default()),
            Arc::new(StubExtractor::default()),
        );

        let result = use_case.execute("p-1").await.unwrap();
        assert!(result.is_commerce);
        assert_eq!(result.products_synced, 0);
        assert!(result.skipped_reason.is_some());
    }

    #[tokio::test]
    async fn extracted_products_are_upserted() {
        let extractor = Arc::new(StubExtractor::default());
        *extractor.supported.lock() = true;
        *extractor.products.lock() = vec![Product::new(
            "pr-1".into(),
            "p-1".into(),
            "led-lamp".into(),
            "LED Lamp".into(),
        )];
        let products = Arc::new(InMemoryProducts::default());

        let use_case = SyncProductsForPageUseCase::new(
            Arc::new(InMemoryPages::with(commerce_page())),
            products.clone(),
            extractor,
        );

        let result = use_case.execute("p-1").await.unwrap();
        assert_eq!(result.products_synced, 1);
        assert!(result.skipped_reason.is_none());
        assert_eq!(products.count_by_page("p-1").await.unwrap(), 1);
    }
}
