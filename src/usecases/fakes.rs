//! In-memory port fakes for use-case unit tests.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::domain::{
    Ad, AdStatus, Alert, CommerceProfile, Country, CreativeAnalysis, CreativeTextAnalysis,
    DomainError, DomainResult, KeywordRun, Language, Page, PageDailyMetrics, Product,
    ProductCount, RankedShop, RankingCriteria, Scan, ScanId, Sentiment, ShopScore, Url,
    Watchlist, WatchlistItem,
};
use crate::domain::tiering;
use crate::ports::*;

#[derive(Default)]
pub struct FakeAdsLibrary {
    pub search_results: Mutex<Vec<RawAd>>,
    pub page_results: Mutex<Vec<RawAd>>,
    pub detail_results: Mutex<Vec<RawAd>>,
    pub fail_with: Mutex<Option<String>>,
}

#[async_trait]
impl AdsLibraryPort for FakeAdsLibrary {
    async fn search_ads_by_keyword(
        &self,
        _keyword: &str,
        _country: Country,
        _language: Option<&Language>,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        if let Some(msg) = self.fail_with.lock().clone() {
            return Err(DomainError::AdsLibrary(msg));
        }
        let mut ads = self.search_results.lock().clone();
        ads.truncate(limit as usize);
        Ok(ads)
    }

    async fn get_ads_by_page(
        &self,
        _advertiser_page_ids: &[String],
        _country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        let mut ads = self.page_results.lock().clone();
        ads.truncate(limit as usize);
        Ok(ads)
    }

    async fn get_ads_details(
        &self,
        _advertiser_page_id: &str,
        _country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        if let Some(msg) = self.fail_with.lock().clone() {
            return Err(DomainError::AdsLibrary(msg));
        }
        let mut ads = self.detail_results.lock().clone();
        ads.truncate(limit as usize);
        Ok(ads)
    }
}

#[derive(Default)]
pub struct FakeHtmlScraper {
    pub html: Mutex<String>,
    pub headers: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl HtmlScraperPort for FakeHtmlScraper {
    async fn fetch_html(&self, _url: &Url) -> DomainResult<String> {
        Ok(self.html.lock().clone())
    }

    async fn fetch_headers(&self, _url: &Url) -> DomainResult<HashMap<String, String>> {
        Ok(self.headers.lock().clone())
    }
}

#[derive(Default)]
pub struct FakeSitemap {
    pub sitemap_urls: Mutex<Vec<Url>>,
    pub product_count: Mutex<u32>,
    pub not_found: Mutex<bool>,
}

#[async_trait]
impl SitemapPort for FakeSitemap {
    async fn get_sitemap_urls(&self, website: &Url) -> DomainResult<Vec<Url>> {
        if *self.not_found.lock() {
            return Err(DomainError::SitemapNotFound(website.to_string()));
        }
        Ok(self.sitemap_urls.lock().clone())
    }

    async fn extract_product_count(
        &self,
        _sitemap_urls: &[Url],
        _country: Country,
    ) -> DomainResult<ProductCount> {
        Ok(ProductCount::new(*self.product_count.lock() as i64).unwrap())
    }
}

/// Deterministic analyzer: score = min(text length, 100), neutral.
pub struct FakeCreativeAnalyzer;

impl CreativeTextAnalyzerPort for FakeCreativeAnalyzer {
    fn analyze_text(&self, text: &str) -> CreativeTextAnalysis {
        CreativeTextAnalysis {
            creative_score: (text.len() as f64).min(100.0),
            style_tags: vec!["direct".into()],
            angle_tags: vec![],
            tone_tags: vec![],
            sentiment: Sentiment::Neutral,
        }
    }

    fn version(&self) -> &str {
        "fake-v1"
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub dispatched: Mutex<Vec<TaskRequest>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl TaskDispatcherPort for RecordingDispatcher {
    async fn dispatch(&self, task: TaskRequest) -> DomainResult<()> {
        if *self.fail.lock() {
            return Err(DomainError::TaskDispatch {
                task: task.name().to_string(),
                reason: "queue unavailable".into(),
            });
        }
        self.dispatched.lock().push(task);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPages {
    pub pages: Mutex<HashMap<String, Page>>,
}

impl InMemoryPages {
    pub fn with(page: Page) -> Self {
        let store = Self::default();
        store.pages.lock().insert(page.id.clone(), page);
        store
    }
}

#[async_trait]
impl PageRepository for InMemoryPages {
    async fn get(&self, id: &str) -> DomainResult<Option<Page>> {
        Ok(self.pages.lock().get(id).cloned())
    }

    async fn get_by_advertiser_page_id(
        &self,
        advertiser_page_id: &str,
    ) -> DomainResult<Option<Page>> {
        Ok(self
            .pages
            .lock()
            .values()
            .find(|p| p.advertiser_page_id == advertiser_page_id)
            .cloned())
    }

    async fn save(&self, page: &Page) -> DomainResult<()> {
        self.pages.lock().insert(page.id.clone(), page.clone());
        Ok(())
    }

    async fn list_all(&self) -> DomainResult<Vec<Page>> {
        let mut pages: Vec<Page> = self.pages.lock().values().cloned().collect();
        pages.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pages)
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Page>> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.pages.lock().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAds {
    pub ads: Mutex<HashMap<String, Ad>>,
}

#[async_trait]
impl AdsRepository for InMemoryAds {
    async fn save_many(&self, ads: &[Ad]) -> DomainResult<()> {
        let mut store = self.ads.lock();
        for ad in ads {
            // upsert by meta_ad_id
            let existing_id = store
                .values()
                .find(|a| a.meta_ad_id == ad.meta_ad_id)
                .map(|a| a.id.clone());
            if let Some(id) = existing_id {
                store.remove(&id);
            }
            store.insert(ad.id.clone(), ad.clone());
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Ad>> {
        Ok(self.ads.lock().get(id).cloned())
    }

    async fn list_by_page(&self, page_id: &str) -> DomainResult<Vec<Ad>> {
        let mut ads: Vec<Ad> = self
            .ads
            .lock()
            .values()
            .filter(|a| a.page_id == page_id)
            .cloned()
            .collect();
        ads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(ads)
    }

    async fn count_active_by_page(&self, page_id: &str) -> DomainResult<u64> {
        Ok(self
            .ads
            .lock()
            .values()
            .filter(|a| a.page_id == page_id && a.status == AdStatus::Active)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryScans {
    pub scans: Mutex<HashMap<String, Scan>>,
}

#[async_trait]
impl ScanRepository for InMemoryScans {
    async fn save(&self, scan: &Scan) -> DomainResult<()> {
        self.scans.lock().insert(scan.id.to_string(), scan.clone());
        Ok(())
    }

    async fn get(&self, id: ScanId) -> DomainResult<Option<Scan>> {
        Ok(self.scans.lock().get(&id.to_string()).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryKeywordRuns {
    pub runs: Mutex<HashMap<String, KeywordRun>>,
}

#[async_trait]
impl KeywordRunRepository for InMemoryKeywordRuns {
    async fn save(&self, run: &KeywordRun) -> DomainResult<()> {
        self.runs.lock().insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<KeywordRun>> {
        Ok(self.runs.lock().get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryScoring {
    pub scores: Mutex<Vec<ShopScore>>,
    /// page_id -> (url, country) used to enrich ranked rows.
    pub page_info: Mutex<HashMap<String, (String, String)>>,
}

#[async_trait]
impl ScoringRepository for InMemoryScoring {
    async fn save(&self, score: &ShopScore) -> DomainResult<()> {
        self.scores.lock().push(score.clone());
        Ok(())
    }

    async fn get_latest_by_page_id(&self, page_id: &str) -> DomainResult<Option<ShopScore>> {
        Ok(self
            .scores
            .lock()
            .iter()
            .filter(|s| s.page_id == page_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn list_by_page(&self, page_id: &str, limit: u32) -> DomainResult<Vec<ShopScore>> {
        let mut scores: Vec<ShopScore> = self
            .scores
            .lock()
            .iter()
            .filter(|s| s.page_id == page_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        scores.truncate(limit as usize);
        Ok(scores)
    }

    async fn list_ranked(&self, criteria: &RankingCriteria) -> DomainResult<Vec<RankedShop>> {
        let mut rows = self.ranked_rows(criteria);
        rows.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows
            .into_iter()
            .skip(criteria.offset as usize)
            .take(criteria.limit as usize)
            .collect())
    }

    async fn count_ranked(&self, criteria: &RankingCriteria) -> DomainResult<u64> {
        Ok(self.ranked_rows(criteria).len() as u64)
    }
}

impl InMemoryScoring {
    fn ranked_rows(&self, criteria: &RankingCriteria) -> Vec<RankedShop> {
        let info = self.page_info.lock();
        let scores = self.scores.lock();

        // latest score per page
        let mut latest: HashMap<&str, &ShopScore> = HashMap::new();
        for score in scores.iter() {
            let entry = latest.entry(score.page_id.as_str()).or_insert(score);
            if score.created_at > entry.created_at {
                *entry = score;
            }
        }

        latest
            .values()
            .filter(|s| {
                if let Some(min) = criteria.min_score {
                    if s.score < min {
                        return false;
                    }
                }
                if let Some((lo, hi)) = criteria.tier_score_range() {
                    let inclusive_upper = criteria.tier.as_deref() == Some("XXL");
                    if s.score < lo || (!inclusive_upper && s.score >= hi) {
                        return false;
                    }
                }
                if let Some(country) = &criteria.country {
                    match info.get(&s.page_id) {
                        Some((_, c)) if c == country.code() => {}
                        _ => return false,
                    }
                }
                true
            })
            .map(|s| RankedShop {
                page_id: s.page_id.clone(),
                score: s.score,
                tier: tiering::score_to_tier(s.score).to_string(),
                url: info.get(&s.page_id).map(|(u, _)| u.clone()),
                country: info.get(&s.page_id).map(|(_, c)| c.clone()),
                name: None,
            })
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryMetrics {
    pub metrics: Mutex<HashMap<(String, NaiveDate), PageDailyMetrics>>,
}

#[async_trait]
impl PageMetricsRepository for InMemoryMetrics {
    async fn upsert_daily_metrics(&self, metrics: &[PageDailyMetrics]) -> DomainResult<()> {
        let mut store = self.metrics.lock();
        for metric in metrics {
            store.insert((metric.page_id.clone(), metric.date), metric.clone());
        }
        Ok(())
    }

    async fn list_page_metrics(
        &self,
        page_id: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        limit: u32,
    ) -> DomainResult<Vec<PageDailyMetrics>> {
        let mut rows: Vec<PageDailyMetrics> = self
            .metrics
            .lock()
            .values()
            .filter(|m| m.page_id == page_id)
            .filter(|m| date_from.map_or(true, |from| m.date >= from))
            .filter(|m| date_to.map_or(true, |to| m.date <= to))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.date);
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryAlerts {
    pub alerts: Mutex<Vec<Alert>>,
    /// Alert types whose save should fail, for partial-failure tests.
    pub fail_types: Mutex<Vec<crate::domain::AlertType>>,
}

#[async_trait]
impl AlertRepository for InMemoryAlerts {
    async fn save(&self, alert: &Alert) -> DomainResult<()> {
        if self.fail_types.lock().contains(&alert.alert_type) {
            return Err(DomainError::repository("save_alert", "injected failure"));
        }
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> DomainResult<Vec<Alert>> {
        let mut alerts = self.alerts.lock().clone();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit as usize);
        Ok(alerts)
    }

    async fn list_by_page(
        &self,
        page_id: &str,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .lock()
            .iter()
            .filter(|a| a.page_id == page_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCreative {
    pub analyses: Mutex<HashMap<String, CreativeAnalysis>>,
}

#[async_trait]
impl CreativeAnalysisRepository for InMemoryCreative {
    async fn get_by_ad_id(&self, ad_id: &str) -> DomainResult<Option<CreativeAnalysis>> {
        Ok(self.analyses.lock().get(ad_id).cloned())
    }

    async fn save(&self, analysis: &CreativeAnalysis) -> DomainResult<()> {
        self.analyses
            .lock()
            .entry(analysis.ad_id.clone())
            .or_insert_with(|| analysis.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfiles {
    pub profiles: Mutex<HashMap<String, CommerceProfile>>,
}

#[async_trait]
impl CommerceProfileRepository for InMemoryProfiles {
    async fn save(&self, profile: &CommerceProfile) -> DomainResult<()> {
        self.profiles
            .lock()
            .insert(profile.page_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_by_page_id(&self, page_id: &str) -> DomainResult<Option<CommerceProfile>> {
        Ok(self.profiles.lock().get(page_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryWatchlists {
    pub watchlists: Mutex<HashMap<String, Watchlist>>,
    pub items: Mutex<Vec<WatchlistItem>>,
}

#[async_trait]
impl WatchlistRepository for InMemoryWatchlists {
    async fn save(&self, watchlist: &Watchlist) -> DomainResult<()> {
        self.watchlists
            .lock()
            .insert(watchlist.id.clone(), watchlist.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Watchlist>> {
        Ok(self.watchlists.lock().get(id).cloned())
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Watchlist>> {
        let mut lists: Vec<Watchlist> = self.watchlists.lock().values().cloned().collect();
        lists.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(lists
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.watchlists.lock().remove(id);
        self.items.lock().retain(|i| i.watchlist_id != id);
        Ok(())
    }

    async fn add_item(&self, item: &WatchlistItem) -> DomainResult<()> {
        let mut items = self.items.lock();
        if items
            .iter()
            .any(|i| i.watchlist_id == item.watchlist_id && i.page_id == item.page_id)
        {
            return Err(DomainError::repository(
                "add_watchlist_item",
                "UNIQUE constraint failed",
            ));
        }
        items.push(item.clone());
        Ok(())
    }

    async fn remove_item(&self, watchlist_id: &str, page_id: &str) -> DomainResult<()> {
        self.items
            .lock()
            .retain(|i| !(i.watchlist_id == watchlist_id && i.page_id == page_id));
        Ok(())
    }

    async fn list_items(&self, watchlist_id: &str) -> DomainResult<Vec<WatchlistItem>> {
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|i| i.watchlist_id == watchlist_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryProducts {
    pub products: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductRepository for InMemoryProducts {
    async fn save_many(&self, products: &[Product]) -> DomainResult<()> {
        let mut store = self.products.lock();
        for product in products {
            store.retain(|p| !(p.page_id == product.page_id && p.handle == product.handle));
            store.push(product.clone());
        }
        Ok(())
    }

    async fn list_by_page(
        &self,
        page_id: &str,
        sort_by: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .lock()
            .iter()
            .filter(|p| p.page_id == page_id)
            .cloned()
            .collect();
        match sort_by {
            Some("price") => products.sort_by(|a, b| {
                a.price_min
                    .partial_cmp(&b.price_min)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            _ => products.sort_by(|a, b| a.title.cmp(&b.title)),
        }
        Ok(products
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_page(&self, page_id: &str) -> DomainResult<u64> {
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| p.page_id == page_id)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryBlacklist {
    pub blocked: Mutex<Vec<String>>,
}

#[async_trait]
impl BlacklistRepository for InMemoryBlacklist {
    async fn is_blacklisted(&self, advertiser_page_id: &str) -> DomainResult<bool> {
        Ok(self
            .blocked
            .lock()
            .iter()
            .any(|b| b == advertiser_page_id))
    }

    async fn add(&self, advertiser_page_id: &str, _reason: Option<&str>) -> DomainResult<()> {
        self.blocked.lock().push(advertiser_page_id.to_string());
        Ok(())
    }
}

/// Page fixture used across use-case tests.
pub fn sample_page(id: &str, advertiser_page_id: &str) -> Page {
    Page::new(
        id.to_string(),
        Url::parse("https://glowshop.com").unwrap(),
        Country::parse("FR").unwrap(),
        advertiser_page_id.to_string(),
        0,
    )
}
