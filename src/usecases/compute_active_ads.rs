//! Active-ads counting use case.
//!
//! Refreshes a page's active-ads count from the ads library, classifies
//! it into an ads-volume tier and promotes verified shops with running
//! ads to `active`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Country, DomainError, DomainResult};
use crate::ports::{AdsLibraryPort, PageRepository};

/// Classification of pages by active-ads volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdsVolumeTier {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

impl AdsVolumeTier {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => AdsVolumeTier::Xs,
            1..=5 => AdsVolumeTier::S,
            6..=20 => AdsVolumeTier::M,
            21..=50 => AdsVolumeTier::L,
            51..=100 => AdsVolumeTier::Xl,
            _ => AdsVolumeTier::Xxl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageAdsCountResult {
    pub page_id: String,
    pub active_ads_count: u32,
    pub tier: AdsVolumeTier,
    pub previous_count: u32,
}

pub struct ComputePageActiveAdsCountUseCase {
    ads_library: Arc<dyn AdsLibraryPort>,
    pages: Arc<dyn PageRepository>,
}

impl ComputePageActiveAdsCountUseCase {
    pub fn new(ads_library: Arc<dyn AdsLibraryPort>, pages: Arc<dyn PageRepository>) -> Self {
        Self { ads_library, pages }
    }

    pub async fn execute(&self, page_id: &str, country: Country) -> DomainResult<PageAdsCountResult> {
        let mut page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        let previous_count = page.active_ads_count;

        let raw_ads = self
            .ads_library
            .get_ads_by_page(&[page.advertiser_page_id.clone()], country, 1000)
            .await?;
        let active_count = raw_ads.iter().filter(|a| a.is_active).count() as u32;

        let total = page.total_ads_count.max(active_count);
        page.update_ads_count(active_count, total)?;
        page.record_scan();
        self.pages.save(&page).await?;

        let tier = AdsVolumeTier::from_count(active_count);

        info!(
            page_id = %page_id,
            active_ads = active_count,
            previous = previous_count,
            tier = ?tier,
            "Active ads count computed"
        );

        Ok(PageAdsCountResult {
            page_id: page_id.to_string(),
            active_ads_count: active_count,
            tier,
            previous_count,
        })
    }
}
