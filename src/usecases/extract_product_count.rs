//! Catalog sizing use case.
//!
//! Discovers sitemaps, counts product-pattern URLs filtered by locale,
//! writes the count onto the page and promotes verified shops with a
//! non-empty catalog to `active`. A missing sitemap is a zero count,
//! not an error.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Country, DomainError, DomainResult, Url};
use crate::ports::{PageRepository, SitemapPort};

#[derive(Debug, Clone)]
pub struct ExtractProductCountResult {
    pub page_id: String,
    pub product_count: u32,
    pub sitemaps_found: u32,
    pub previous_count: u32,
}

pub struct ExtractProductCountUseCase {
    sitemap: Arc<dyn SitemapPort>,
    pages: Arc<dyn PageRepository>,
}

impl ExtractProductCountUseCase {
    pub fn new(sitemap: Arc<dyn SitemapPort>, pages: Arc<dyn PageRepository>) -> Self {
        Self { sitemap, pages }
    }

    pub async fn execute(
        &self,
        page_id: &str,
        website_url: &Url,
        country: Country,
    ) -> DomainResult<ExtractProductCountResult> {
        info!(page_id = %page_id, url = %website_url, country = %country, "Starting product count extraction");

        let mut page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        let previous_count = page.product_count.value();

        let sitemap_urls = match self.sitemap.get_sitemap_urls(website_url).await {
            Ok(urls) => urls,
            Err(DomainError::SitemapNotFound(_)) => {
                warn!(page_id = %page_id, url = %website_url, "No sitemaps found");
                return Ok(ExtractProductCountResult {
                    page_id: page_id.to_string(),
                    product_count: 0,
                    sitemaps_found: 0,
                    previous_count,
                });
            }
            Err(err) => return Err(err),
        };

        if sitemap_urls.is_empty() {
            warn!(page_id = %page_id, url = %website_url, "Sitemap discovery returned nothing");
            return Ok(ExtractProductCountResult {
                page_id: page_id.to_string(),
                product_count: 0,
                sitemaps_found: 0,
                previous_count,
            });
        }

        let product_count = self
            .sitemap
            .extract_product_count(&sitemap_urls, country)
            .await?;

        page.set_product_count(product_count)?;
        page.record_scan();
        self.pages.save(&page).await?;

        info!(
            page_id = %page_id,
            product_count = product_count.value(),
            previous_count,
            sitemaps = sitemap_urls.len(),
            "Product count extraction completed"
        );

        Ok(ExtractProductCountResult {
            page_id: page_id.to_string(),
            product_count: product_count.value(),
            sitemaps_found: sitemap_urls.len() as u32,
            previous_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageStatus;
    use crate::usecases::fakes::*;

    fn verified_page() -> crate::domain::Page {
        let mut page = sample_page("p-1", "adv-1");
        page.begin_analysis().unwrap();
        page.mark_as_commerce("profile-1".into()).unwrap();
        page
    }

    #[tokio::test]
    async fn missing_sitemap_returns_zero_not_error() {
        let sitemap = Arc::new(FakeSitemap::default());
        *sitemap.not_found.lock() = true;
        let pages = Arc::new(InMemoryPages::with(verified_page()));

        let result = ExtractProductCountUseCase::new(sitemap, pages.clone())
            .execute(
                "p-1",
                &Url::parse("https://glowshop.com").unwrap(),
                Country::parse("FR").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(result.product_count, 0);
        assert_eq!(result.sitemaps_found, 0);
        // page untouched
        let page = pages.pages.lock().get("p-1").cloned().unwrap();
        assert_eq!(page.state, PageStatus::VerifiedCommerce);
    }

    #[tokio::test]
    async fn positive_count_promotes_verified_page_to_active() {
        let sitemap = Arc::new(FakeSitemap::default());
        *sitemap.sitemap_urls.lock() =
            vec![Url::parse("https://glowshop.com/sitemap_products_1.xml").unwrap()];
        *sitemap.product_count.lock() = 42;
        let pages = Arc::new(InMemoryPages::with(verified_page()));

        let result = ExtractProductCountUseCase::new(sitemap, pages.clone())
            .execute(
                "p-1",
                &Url::parse("https://glowshop.com").unwrap(),
                Country::parse("FR").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(result.product_count, 42);
        assert_eq!(result.sitemaps_found, 1);
        let page = pages.pages.lock().get("p-1").cloned().unwrap();
        assert_eq!(page.product_count.value(), 42);
        assert_eq!(page.state, PageStatus::Active);
    }

    #[tokio::test]
    async fn previous_count_is_reported() {
        let sitemap = Arc::new(FakeSitemap::default());
        *sitemap.sitemap_urls.lock() =
            vec![Url::parse("https://glowshop.com/sitemap.xml").unwrap()];
        *sitemap.product_count.lock() = 10;

        let mut page = verified_page();
        page.set_product_count(crate::domain::ProductCount::new(7).unwrap())
            .unwrap();
        let pages = Arc::new(InMemoryPages::with(page));

        let result = ExtractProductCountUseCase::new(sitemap, pages)
            .execute(
                "p-1",
                &Url::parse("https://glowshop.com").unwrap(),
                Country::parse("FR").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(result.previous_count, 7);
        assert_eq!(result.product_count, 10);
    }

    #[tokio::test]
    async fn unknown_page_fails() {
        let result = ExtractProductCountUseCase::new(
            Arc::new(FakeSitemap::default()),
            Arc::new(InMemoryPages::default()),
        )
        .execute(
            "missing",
            &Url::parse("https://glowshop.com").unwrap(),
            Country::parse("FR").unwrap(),
        )
        .await;
        assert!(matches!(result, Err(DomainError::EntityNotFound { .. })));
    }
}
