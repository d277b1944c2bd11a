//! Service wiring shared by the API server and the workers.
//!
//! Builds every repository and use case over one database handle. The
//! outbound clients are injected as port trait objects so tests can
//! swap in fakes.

use std::sync::Arc;

use crate::ports::{
    AdsLibraryPort, AdsRepository, AlertRepository, BlacklistRepository,
    CommerceProfileRepository, CreativeAnalysisRepository, HtmlScraperPort,
    KeywordRunRepository, PageMetricsRepository, PageRepository, ProductExtractorPort,
    ProductRepository, ScanRepository, ScoringRepository, SitemapPort, TaskDispatcherPort,
    WatchlistRepository,
};
use crate::queue::QueueTaskDispatcher;
use crate::scrapers::CreativeTextAnalyzer;
use crate::storage::{
    Database, SqliteAdsRepository, SqliteAlertRepository, SqliteBlacklistRepository,
    SqliteCommerceProfileRepository, SqliteCreativeAnalysisRepository,
    SqliteKeywordRunRepository, SqlitePageMetricsRepository, SqlitePageRepository,
    SqliteProductRepository, SqliteScanRepository, SqliteScoringRepository,
    SqliteWatchlistRepository, TaskQueue,
};
use crate::usecases::{
    AnalysePageDeepUseCase, AnalyseWebsiteUseCase, BuildPageCreativeInsightsUseCase,
    ComputePageActiveAdsCountUseCase, ComputeShopScoreUseCase, DetectAlertsForPageUseCase,
    ExtractProductCountUseCase, GetMonitoringSummaryUseCase, GetPageMetricsHistoryUseCase,
    GetRankedShopsUseCase, RecordDailyMetricsForAllPagesUseCase, SearchAdsByKeywordUseCase,
    SyncProductsForPageUseCase, WatchlistsUseCase,
};

/// Build the full service graph from configuration, with the real
/// outbound clients.
pub fn build_services(config: &crate::Config) -> anyhow::Result<Arc<Services>> {
    use crate::scrapers::{AdsLibraryClient, AdsLibraryConfig, HtmlScraper, SitemapClient};
    use anyhow::Context;
    use std::time::Duration;

    let db = Database::open(&config.database_path)?;

    let http_client = reqwest::Client::builder()
        .user_agent(config.http_user_agent.clone())
        .timeout(config.http_timeout)
        .pool_max_idle_per_host(5)
        .build()
        .context("Failed to build HTTP client")?;

    let ads_library = Arc::new(AdsLibraryClient::new(
        http_client.clone(),
        AdsLibraryConfig {
            base_url: config.ads_library_base_url.clone(),
            api_version: config.ads_library_api_version.clone(),
            access_token: config.ads_library_token.clone(),
            timeout: Duration::from_secs(30),
        },
    ));
    let html_scraper = Arc::new(HtmlScraper::new(http_client.clone()));
    let sitemap = Arc::new(SitemapClient::new(http_client.clone()));
    let product_extractor = Arc::new(crate::scrapers::ProductFeedExtractor::new(http_client));

    Ok(Arc::new(Services::new(
        db,
        ads_library,
        html_scraper,
        sitemap,
        product_extractor,
    )))
}

/// Everything the binaries need, wired once at startup.
pub struct Services {
    pub queue: TaskQueue,
    pub dispatcher: Arc<dyn TaskDispatcherPort>,

    pub pages: Arc<dyn PageRepository>,
    pub ads: Arc<dyn AdsRepository>,
    pub scans: Arc<dyn ScanRepository>,
    pub keyword_runs: Arc<dyn KeywordRunRepository>,
    pub scoring: Arc<dyn ScoringRepository>,
    pub metrics: Arc<dyn PageMetricsRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub creative_analyses: Arc<dyn CreativeAnalysisRepository>,
    pub profiles: Arc<dyn CommerceProfileRepository>,
    pub watchlist_repo: Arc<dyn WatchlistRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub blacklist: Arc<dyn BlacklistRepository>,

    pub search_ads: SearchAdsByKeywordUseCase,
    pub deep_analysis: AnalysePageDeepUseCase,
    pub website_analysis: AnalyseWebsiteUseCase,
    pub catalog_sizing: ExtractProductCountUseCase,
    pub shop_score: ComputeShopScoreUseCase,
    pub creative_insights: BuildPageCreativeInsightsUseCase,
    pub detect_alerts: DetectAlertsForPageUseCase,
    pub daily_snapshot: RecordDailyMetricsForAllPagesUseCase,
    pub metrics_history: GetPageMetricsHistoryUseCase,
    pub ranked_shops: GetRankedShopsUseCase,
    pub watchlists: WatchlistsUseCase,
    pub active_ads: ComputePageActiveAdsCountUseCase,
    pub monitoring: GetMonitoringSummaryUseCase,
    pub sync_products: SyncProductsForPageUseCase,
}

impl Services {
    pub fn new(
        db: Database,
        ads_library: Arc<dyn AdsLibraryPort>,
        html_scraper: Arc<dyn HtmlScraperPort>,
        sitemap: Arc<dyn SitemapPort>,
        product_extractor: Arc<dyn ProductExtractorPort>,
    ) -> Self {
        let queue = TaskQueue::new(db.clone());
        let dispatcher: Arc<dyn TaskDispatcherPort> =
            Arc::new(QueueTaskDispatcher::new(queue.clone()));

        let pages: Arc<dyn PageRepository> = Arc::new(SqlitePageRepository::new(db.clone()));
        let ads: Arc<dyn AdsRepository> = Arc::new(SqliteAdsRepository::new(db.clone()));
        let scans: Arc<dyn ScanRepository> = Arc::new(SqliteScanRepository::new(db.clone()));
        let keyword_runs: Arc<dyn KeywordRunRepository> =
            Arc::new(SqliteKeywordRunRepository::new(db.clone()));
        let scoring: Arc<dyn ScoringRepository> =
            Arc::new(SqliteScoringRepository::new(db.clone()));
        let metrics: Arc<dyn PageMetricsRepository> =
            Arc::new(SqlitePageMetricsRepository::new(db.clone()));
        let alerts: Arc<dyn AlertRepository> = Arc::new(SqliteAlertRepository::new(db.clone()));
        let creative_analyses: Arc<dyn CreativeAnalysisRepository> =
            Arc::new(SqliteCreativeAnalysisRepository::new(db.clone()));
        let profiles: Arc<dyn CommerceProfileRepository> =
            Arc::new(SqliteCommerceProfileRepository::new(db.clone()));
        let watchlist_repo: Arc<dyn WatchlistRepository> =
            Arc::new(SqliteWatchlistRepository::new(db.clone()));
        let products: Arc<dyn ProductRepository> =
            Arc::new(SqliteProductRepository::new(db.clone()));
        let blacklist: Arc<dyn BlacklistRepository> =
            Arc::new(SqliteBlacklistRepository::new(db.clone()));

        let analyzer = Arc::new(CreativeTextAnalyzer::new());

        Self {
            search_ads: SearchAdsByKeywordUseCase::new(
                ads_library.clone(),
                pages.clone(),
                keyword_runs.clone(),
                ads.clone(),
                blacklist.clone(),
            ),
            deep_analysis: AnalysePageDeepUseCase::new(
                ads_library.clone(),
                ads.clone(),
                scans.clone(),
                pages.clone(),
                dispatcher.clone(),
            ),
            website_analysis: AnalyseWebsiteUseCase::new(
                html_scraper,
                pages.clone(),
                profiles.clone(),
                dispatcher.clone(),
            ),
            catalog_sizing: ExtractProductCountUseCase::new(sitemap, pages.clone()),
            shop_score: ComputeShopScoreUseCase::new(
                pages.clone(),
                ads.clone(),
                scoring.clone(),
            ),
            creative_insights: BuildPageCreativeInsightsUseCase::new(
                pages.clone(),
                ads.clone(),
                creative_analyses.clone(),
                analyzer,
            ),
            detect_alerts: DetectAlertsForPageUseCase::new(alerts.clone()),
            daily_snapshot: RecordDailyMetricsForAllPagesUseCase::new(
                pages.clone(),
                scoring.clone(),
                products.clone(),
                metrics.clone(),
            ),
            metrics_history: GetPageMetricsHistoryUseCase::new(pages.clone(), metrics.clone()),
            ranked_shops: GetRankedShopsUseCase::new(scoring.clone()),
            watchlists: WatchlistsUseCase::new(
                watchlist_repo.clone(),
                pages.clone(),
                dispatcher.clone(),
            ),
            active_ads: ComputePageActiveAdsCountUseCase::new(ads_library, pages.clone()),
            monitoring: GetMonitoringSummaryUseCase::new(
                pages.clone(),
                scoring.clone(),
                alerts.clone(),
            ),
            sync_products: SyncProductsForPageUseCase::new(
                pages.clone(),
                products.clone(),
                product_extractor,
            ),
            queue,
            dispatcher,
            pages,
            ads,
            scans,
            keyword_runs,
            scoring,
            metrics,
            alerts,
            creative_analyses,
            profiles,
            watchlist_repo,
            products,
            blacklist,
        }
    }
}
