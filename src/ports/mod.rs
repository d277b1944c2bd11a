//! Port contracts between use cases and the outside world.
//!
//! Use cases depend only on these traits; concrete adapters live in
//! `crate::scrapers`, `crate::storage` and `crate::queue`. Tests inject
//! in-memory fakes satisfying the same interfaces.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    Ad, Alert, CommerceProfile, Country, CreativeAnalysis, CreativeTextAnalysis, DomainResult,
    KeywordRun, Language, Page, PageDailyMetrics, Product, ProductCount, RankedShop,
    RankingCriteria, Scan, ScanId, ShopScore, Url, Watchlist, WatchlistItem,
};

/// One raw creative as returned by the ads library. Decoded
/// tolerantly: missing fields default, unknown fields are ignored, and
/// `countries` accepts both a single string and a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAd {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub page_name: String,
    #[serde(default)]
    pub ad_creative_bodies: Vec<String>,
    #[serde(default)]
    pub ad_creative_link_titles: Vec<String>,
    #[serde(default)]
    pub ad_creative_link_captions: Vec<String>,
    #[serde(default)]
    pub ad_creative_link_descriptions: Vec<String>,
    #[serde(default)]
    pub ad_snapshot_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub call_to_action_type: Option<String>,
    #[serde(default)]
    pub publisher_platforms: Vec<String>,
    #[serde(default, deserialize_with = "de_string_or_list")]
    pub countries: Vec<String>,
    #[serde(default)]
    pub ad_delivery_start_time: Option<String>,
    #[serde(default)]
    pub ad_delivery_stop_time: Option<String>,
    #[serde(default)]
    pub impressions: Option<InsightRange>,
    #[serde(default)]
    pub spend: Option<InsightRange>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Lower/upper bound pair the library reports for impressions and
/// spend. Bounds arrive as strings or numbers depending on the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightRange {
    #[serde(default, deserialize_with = "de_opt_number")]
    pub lower_bound: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub upper_bound: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn de_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(vec![s]),
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()),
        serde_json::Value::Null => Ok(Vec::new()),
        _ => Ok(Vec::new()),
    }
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
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

/// Client for the public ads library. Implementations own pagination,
/// the bearer token, retries and rate-limit handling.
#[async_trait]
pub trait AdsLibraryPort: Send + Sync {
    async fn search_ads_by_keyword(
        &self,
        keyword: &str,
        country: Country,
        language: Option<&Language>,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>>;

    /// Batched by the wire protocol at 10 page ids per request.
    async fn get_ads_by_page(
        &self,
        advertiser_page_ids: &[String],
        country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>>;

    async fn get_ads_details(
        &self,
        advertiser_page_id: &str,
        country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>>;
}

#[async_trait]
pub trait HtmlScraperPort: Send + Sync {
    async fn fetch_html(&self, url: &Url) -> DomainResult<String>;

    /// Headers only (HEAD request), lowercased header names.
    async fn fetch_headers(&self, url: &Url) -> DomainResult<HashMap<String, String>>;
}

#[async_trait]
pub trait SitemapPort: Send + Sync {
    /// Discover sitemap URLs for a website, product sitemaps first.
    /// Fails with `SitemapNotFound` when no probe location answers.
    async fn get_sitemap_urls(&self, website: &Url) -> DomainResult<Vec<Url>>;

    /// Count product-page URLs across the given sitemaps, applying the
    /// locale filter for `country`.
    async fn extract_product_count(
        &self,
        sitemap_urls: &[Url],
        country: Country,
    ) -> DomainResult<ProductCount>;
}

/// Pure heuristic analyzer over one creative's concatenated text.
pub trait CreativeTextAnalyzerPort: Send + Sync {
    fn analyze_text(&self, text: &str) -> CreativeTextAnalysis;
    fn version(&self) -> &str;
}

/// Extracts catalog products from a storefront's public product feed.
#[async_trait]
pub trait ProductExtractorPort: Send + Sync {
    /// Whether the store exposes a readable product feed.
    async fn is_supported(&self, store_url: &Url) -> DomainResult<bool>;

    async fn extract_products(
        &self,
        page_id: &str,
        store_url: &Url,
    ) -> DomainResult<Vec<Product>>;
}

/// Typed task requests flowing into the durable queue. Names and args
/// match the queue wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "snake_case")]
pub enum TaskRequest {
    ScanPage {
        page_id: String,
        scan_id: ScanId,
        country: Country,
    },
    AnalyseWebsite {
        page_id: String,
        url: Url,
    },
    CountSitemapProducts {
        page_id: String,
        website: Url,
        country: Country,
    },
    ComputeShopScore {
        page_id: String,
    },
    AnalyzeCreativesForPage {
        page_id: String,
    },
    SnapshotDailyMetrics,
}

impl TaskRequest {
    pub fn name(&self) -> &'static str {
        match self {
            TaskRequest::ScanPage { .. } => "scan_page",
            TaskRequest::AnalyseWebsite { .. } => "analyse_website",
            TaskRequest::CountSitemapProducts { .. } => "count_sitemap_products",
            TaskRequest::ComputeShopScore { .. } => "compute_shop_score",
            TaskRequest::AnalyzeCreativesForPage { .. } => "analyze_creatives_for_page",
            TaskRequest::SnapshotDailyMetrics => "snapshot_daily_metrics",
        }
    }
}

#[async_trait]
pub trait TaskDispatcherPort: Send + Sync {
    async fn dispatch(&self, task: TaskRequest) -> DomainResult<()>;
}

#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn get(&self, id: &str) -> DomainResult<Option<Page>>;
    async fn get_by_advertiser_page_id(&self, advertiser_page_id: &str)
        -> DomainResult<Option<Page>>;
    /// Insert or update by id.
    async fn save(&self, page: &Page) -> DomainResult<()>;
    async fn list_all(&self) -> DomainResult<Vec<Page>>;
    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Page>>;
    async fn count(&self) -> DomainResult<u64>;
}

#[async_trait]
pub trait AdsRepository: Send + Sync {
    /// Batch upsert keyed on `meta_ad_id`, one transaction.
    async fn save_many(&self, ads: &[Ad]) -> DomainResult<()>;
    async fn get(&self, id: &str) -> DomainResult<Option<Ad>>;
    async fn list_by_page(&self, page_id: &str) -> DomainResult<Vec<Ad>>;
    async fn count_active_by_page(&self, page_id: &str) -> DomainResult<u64>;
}

#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn save(&self, scan: &Scan) -> DomainResult<()>;
    async fn get(&self, id: ScanId) -> DomainResult<Option<Scan>>;
}

#[async_trait]
pub trait KeywordRunRepository: Send + Sync {
    async fn save(&self, run: &KeywordRun) -> DomainResult<()>;
    async fn get(&self, id: &str) -> DomainResult<Option<KeywordRun>>;
}

#[async_trait]
pub trait ScoringRepository: Send + Sync {
    /// Scores are append-only; every save is a new row.
    async fn save(&self, score: &ShopScore) -> DomainResult<()>;
    async fn get_latest_by_page_id(&self, page_id: &str) -> DomainResult<Option<ShopScore>>;
    async fn list_by_page(&self, page_id: &str, limit: u32) -> DomainResult<Vec<ShopScore>>;
    async fn list_ranked(&self, criteria: &RankingCriteria) -> DomainResult<Vec<RankedShop>>;
    async fn count_ranked(&self, criteria: &RankingCriteria) -> DomainResult<u64>;
}

#[async_trait]
pub trait PageMetricsRepository: Send + Sync {
    /// Upsert keyed on (page_id, date), one transaction for the batch.
    async fn upsert_daily_metrics(&self, metrics: &[PageDailyMetrics]) -> DomainResult<()>;
    async fn list_page_metrics(
        &self,
        page_id: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        limit: u32,
    ) -> DomainResult<Vec<PageDailyMetrics>>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn save(&self, alert: &Alert) -> DomainResult<()>;
    async fn list_recent(&self, limit: u32) -> DomainResult<Vec<Alert>>;
    async fn list_by_page(&self, page_id: &str, limit: u32, offset: u32)
        -> DomainResult<Vec<Alert>>;
}

#[async_trait]
pub trait CreativeAnalysisRepository: Send + Sync {
    async fn get_by_ad_id(&self, ad_id: &str) -> DomainResult<Option<CreativeAnalysis>>;
    /// First write wins; saving again for the same ad id is a no-op.
    async fn save(&self, analysis: &CreativeAnalysis) -> DomainResult<()>;
}

#[async_trait]
pub trait CommerceProfileRepository: Send + Sync {
    async fn save(&self, profile: &CommerceProfile) -> DomainResult<()>;
    async fn get_by_page_id(&self, page_id: &str) -> DomainResult<Option<CommerceProfile>>;
}

#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    async fn save(&self, watchlist: &Watchlist) -> DomainResult<()>;
    async fn get(&self, id: &str) -> DomainResult<Option<Watchlist>>;
    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Watchlist>>;
    async fn delete(&self, id: &str) -> DomainResult<()>;
    async fn add_item(&self, item: &WatchlistItem) -> DomainResult<()>;
    async fn remove_item(&self, watchlist_id: &str, page_id: &str) -> DomainResult<()>;
    async fn list_items(&self, watchlist_id: &str) -> DomainResult<Vec<WatchlistItem>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Batch upsert keyed on (page_id, handle).
    async fn save_many(&self, products: &[Product]) -> DomainResult<()>;
    async fn list_by_page(
        &self,
        page_id: &str,
        sort_by: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<Product>>;
    async fn count_by_page(&self, page_id: &str) -> DomainResult<u64>;
}

#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    async fn is_blacklisted(&self, advertiser_page_id: &str) -> DomainResult<bool>;
    async fn add(&self, advertiser_page_id: &str, reason: Option<&str>) -> DomainResult<()>;
}
