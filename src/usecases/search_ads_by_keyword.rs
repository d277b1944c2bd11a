//! Keyword search use case.
//!
//! Streams raw ads from the ads library, groups them by advertiser,
//! extracts a canonical destination URL per new advertiser, and upserts
//! pages and ads. The whole invocation is recorded as a KeywordRun.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Ad, AdPlatform, Country, DomainError, DomainResult, KeywordRun, KeywordRunResult, Language,
    Page, ScanId, Url,
};
use crate::ports::{
    AdsLibraryPort, AdsRepository, BlacklistRepository, KeywordRunRepository, PageRepository,
    RawAd,
};

/// CTA phrases that ad link fields contain instead of a URL.
const CTA_SKIP_PHRASES: &[&str] = &[
    "shop now",
    "learn more",
    "sign up",
    "get started",
    "buy now",
    "order now",
    "subscribe",
    "contact us",
    "voir plus",
    "en savoir plus",
    "acheter",
    "commander",
    "s'inscrire",
    "nous contacter",
    "decouvrir",
];

lazy_static! {
    // Bare hostnames like "example.com", "www.shop.example.co.uk"
    static ref DOMAIN_PATTERN: Regex = Regex::new(
        r"(?:https?://)?(?:www\.)?([a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.[a-zA-Z]{2,})"
    )
    .unwrap();
}

#[derive(Debug, Clone)]
pub struct SearchAdsResult {
    pub pages: Vec<String>,
    pub count_ads: u32,
    pub scan_id: ScanId,
    pub new_pages: u32,
}

pub struct SearchAdsByKeywordUseCase {
    ads_library: Arc<dyn AdsLibraryPort>,
    pages: Arc<dyn PageRepository>,
    keyword_runs: Arc<dyn KeywordRunRepository>,
    ads: Arc<dyn AdsRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
}

impl SearchAdsByKeywordUseCase {
    pub fn new(
        ads_library: Arc<dyn AdsLibraryPort>,
        pages: Arc<dyn PageRepository>,
        keyword_runs: Arc<dyn KeywordRunRepository>,
        ads: Arc<dyn AdsRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
    ) -> Self {
        Self {
            ads_library,
            pages,
            keyword_runs,
            ads,
            blacklist,
        }
    }

    pub async fn execute(
        &self,
        keyword: &str,
        country: Country,
        language: Option<Language>,
        limit: u32,
        scan_id: Option<ScanId>,
    ) -> DomainResult<SearchAdsResult> {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(DomainError::InvalidKeyword(
                "keyword cannot be empty".into(),
            ));
        }

        let scan_id = scan_id.unwrap_or_else(ScanId::generate);

        info!(keyword = %keyword, country = %country, scan_id = %scan_id, "Starting keyword search");

        let mut run = KeywordRun::new(
            Uuid::new_v4().to_string(),
            keyword.clone(),
            country,
            limit,
        );
        run.start();
        self.keyword_runs.save(&run).await?;

        match self
            .process(&keyword, country, language.as_ref(), limit)
            .await
        {
            Ok(outcome) => {
                run.complete(KeywordRunResult {
                    total_ads_found: outcome.total_ads_found,
                    unique_pages_found: outcome.pages.len() as u32,
                    new_pages_found: outcome.new_pages,
                    ads_processed: outcome.ads_processed,
                });
                self.keyword_runs.save(&run).await?;

                info!(
                    keyword = %keyword,
                    ads_found = outcome.total_ads_found,
                    pages_found = outcome.pages.len(),
                    new_pages = outcome.new_pages,
                    "Keyword search completed"
                );

                Ok(SearchAdsResult {
                    pages: outcome.pages,
                    count_ads: outcome.total_ads_found,
                    scan_id,
                    new_pages: outcome.new_pages,
                })
            }
            Err(err) => {
                // Record the failure before propagating; rate limits are
                // recorded distinctly so the run stays retryable.
                match &err {
                    DomainError::AdsLibraryRateLimit { retry_after_secs } => {
                        run.rate_limited(*retry_after_secs)
                    }
                    other => run.fail(other.to_string()),
                }
                if let Err(save_err) = self.keyword_runs.save(&run).await {
                    warn!(error = %save_err, "Failed to record keyword run failure");
                }
                Err(err)
            }
        }
    }

    async fn process(
        &self,
        keyword: &str,
        country: Country,
        language: Option<&Language>,
        limit: u32,
    ) -> DomainResult<ProcessOutcome> {
        let raw_ads = self
            .ads_library
            .search_ads_by_keyword(keyword, country, language, limit)
            .await?;
        let total_ads_found = raw_ads.len() as u32;

        // Group by advertiser page id, preserving first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<RawAd>> = HashMap::new();
        for raw in raw_ads {
            if raw.page_id.is_empty() {
                continue;
            }
            if !groups.contains_key(&raw.page_id) {
                order.push(raw.page_id.clone());
            }
            groups.entry(raw.page_id.clone()).or_default().push(raw);
        }

        info!(
            total_ads = total_ads_found,
            unique_pages = order.len(),
            "Grouped ads by advertiser"
        );

        let mut saved_page_ids: Vec<String> = Vec::new();
        let mut new_pages = 0_u32;
        let mut skipped_no_url = 0_u32;
        let mut ads_to_save: Vec<Ad> = Vec::new();

        for advertiser_page_id in &order {
            let group = &groups[advertiser_page_id];

            if self.blacklist.is_blacklisted(advertiser_page_id).await? {
                debug!(advertiser_page_id = %advertiser_page_id, "Skipping blacklisted advertiser");
                continue;
            }

            let page_id = match self
                .pages
                .get_by_advertiser_page_id(advertiser_page_id)
                .await?
            {
                Some(mut page) => {
                    let total = page.total_ads_count + group.len() as u32;
                    page.update_ads_count(group.len() as u32, total)?;
                    self.pages.save(&page).await?;
                    page.id
                }
                None => match extract_best_url(group) {
                    Some(url) => {
                        let page = Page::new(
                            Uuid::new_v4().to_string(),
                            url,
                            country,
                            advertiser_page_id.clone(),
                            group.len() as u32,
                        );
                        self.pages.save(&page).await?;
                        new_pages += 1;
                        page.id
                    }
                    None => {
                        skipped_no_url += 1;
                        continue;
                    }
                },
            };

            saved_page_ids.push(page_id.clone());

            // Per-ad conversion failures skip the ad, never the batch.
            let mut seen_meta_ids: Vec<&str> = Vec::new();
            for raw in group {
                if raw.id.is_empty() || seen_meta_ids.contains(&raw.id.as_str()) {
                    continue;
                }
                match convert_raw_ad(raw, &page_id) {
                    Some(ad) => {
                        seen_meta_ids.push(raw.id.as_str());
                        ads_to_save.push(ad);
                    }
                    None => {
                        warn!(raw_ad_id = %raw.id, "Failed to convert raw ad, skipping");
                    }
                }
            }
        }

        if skipped_no_url > 0 {
            info!(skipped = skipped_no_url, "Advertisers skipped without a usable URL");
        }

        let ads_processed = ads_to_save.len() as u32;
        if !ads_to_save.is_empty() {
            self.ads.save_many(&ads_to_save).await?;
        }

        Ok(ProcessOutcome {
            pages: saved_page_ids,
            total_ads_found,
            new_pages,
            ads_processed,
        })
    }
}

struct ProcessOutcome {
    pages: Vec<String>,
    total_ads_found: u32,
    new_pages: u32,
    ads_processed: u32,
}

/// Extract the canonical destination URL for an advertiser group.
///
/// Candidates come from link captions, then titles, then descriptions,
/// then the advertiser name. The mode wins; ties break on first-seen
/// order.
pub(crate) fn extract_best_url(ads: &[RawAd]) -> Option<Url> {
    let mut candidates: Vec<String> = Vec::new();

    for ad in ads {
        for field in [
            &ad.ad_creative_link_captions,
            &ad.ad_creative_link_titles,
            &ad.ad_creative_link_descriptions,
        ] {
            for text in field {
                if let Some(cleaned) = clean_url(text) {
                    candidates.push(cleaned);
                }
            }
        }
    }

    if candidates.is_empty() {
        // Some advertiser names are literally domains like "example.com"
        for ad in ads {
            if let Some(cleaned) = clean_url(&ad.page_name) {
                candidates.push(cleaned);
                break;
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }

    let mut counts: Vec<(&String, usize)> = Vec::new();
    for candidate in &candidates {
        match counts.iter_mut().find(|(url, _)| *url == candidate) {
            Some((_, count)) => *count += 1,
            None => counts.push((candidate, 1)),
        }
    }
    // strictly-greater comparison keeps first-seen order on ties
    let mut best: Option<(&String, usize)> = None;
    for (url, count) in &counts {
        if best.map_or(true, |(_, best_count)| *count > best_count) {
            best = Some((url, *count));
        }
    }
    Url::parse(best?.0).ok()
}

/// Clean a candidate string into a scheme+host URL, or reject it.
pub(crate) fn clean_url(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if CTA_SKIP_PHRASES.contains(&lower.as_str()) {
        return None;
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Url::parse(trimmed).ok().map(|u| u.base());
    }

    let captures = DOMAIN_PATTERN.captures(trimmed)?;
    let domain = captures.get(1)?.as_str();
    let tld = domain.rsplit('.').next()?;
    if !domain.contains('.') || tld.len() < 2 {
        return None;
    }
    Some(format!("https://{}", domain))
}

/// Convert one raw library ad into an Ad entity. Returns None when the
/// record is unusable (missing library id).
pub(crate) fn convert_raw_ad(raw: &RawAd, page_id: &str) -> Option<Ad> {
    if raw.id.is_empty() {
        return None;
    }

    let mut ad = Ad::new(
        Uuid::new_v4().to_string(),
        page_id.to_string(),
        raw.page_id.clone(),
        raw.id.clone(),
    );

    ad.body = raw.ad_creative_bodies.first().cloned().filter(|s| !s.is_empty());
    ad.title = raw
        .ad_creative_link_titles
        .first()
        .cloned()
        .filter(|s| !s.is_empty());

    if let Some(caption) = raw.ad_creative_link_captions.first() {
        if !caption.is_empty() {
            ad.link_url = Some(normalize_link(caption));
        }
    }
    if let Some(link) = &raw.link_url {
        if !link.is_empty() {
            ad.link_url = Some(normalize_link(link));
        }
    }

    ad.image_url = raw.ad_snapshot_url.clone().or_else(|| raw.image_url.clone());
    ad.video_url = raw.video_url.clone();
    ad.cta_type = raw.call_to_action_type.clone();
    ad.platforms = raw
        .publisher_platforms
        .iter()
        .map(|p| AdPlatform::parse(p))
        .collect();
    ad.countries = raw
        .countries
        .iter()
        .filter_map(|c| Country::parse(c).ok())
        .collect();
    ad.countries.sort();
    ad.countries.dedup();
    ad.currency = raw.currency.clone();
    if let Some(impressions) = &raw.impressions {
        ad.impressions_lower = impressions.lower_bound.map(|v| v as i64);
        ad.impressions_upper = impressions.upper_bound.map(|v| v as i64);
    }
    if let Some(spend) = &raw.spend {
        ad.spend_lower = spend.lower_bound;
        ad.spend_upper = spend.upper_bound;
    }

    Some(ad)
}

fn normalize_link(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{}", link)
    }
}
