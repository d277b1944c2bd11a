//! Use cases - the application core.
//!
//! Each use case composes port traits sequentially; parallelism is
//! opt-in at the worker level, never required for correctness.

pub mod analyse_page_deep;
pub mod analyse_website;
pub mod compute_active_ads;
pub mod compute_shop_score;
pub mod creative_insights;
pub mod detect_alerts;
pub mod extract_product_count;
pub mod metrics;
pub mod monitoring;
pub mod ranked_shops;
pub mod search_ads_by_keyword;
pub mod sync_products;
pub mod watchlists;

#[cfg(test)]
pub(crate) mod fakes;

pub use analyse_page_deep::{AnalysePageDeepResult, AnalysePageDeepUseCase};
pub use analyse_website::{AnalyseWebsiteResult, AnalyseWebsiteUseCase};
pub use compute_active_ads::{AdsVolumeTier, ComputePageActiveAdsCountUseCase, PageAdsCountResult};
pub use compute_shop_score::{ComputeShopScoreResult, ComputeShopScoreUseCase};
pub use creative_insights::{
    AnalyzeAdCreativeUseCase, BuildPageCreativeInsightsResult, BuildPageCreativeInsightsUseCase,
};
pub use detect_alerts::{
    DetectAlertsForPageUseCase, DetectAlertsInput, ADS_BOOST_RATIO_THRESHOLD,
    SCORE_CHANGE_THRESHOLD,
};
pub use extract_product_count::{ExtractProductCountResult, ExtractProductCountUseCase};
pub use metrics::{
    GetPageMetricsHistoryUseCase, RecordDailyMetricsForAllPagesUseCase, RecordDailyMetricsResult,
};
pub use monitoring::{GetMonitoringSummaryUseCase, MonitoringSummary};
pub use ranked_shops::GetRankedShopsUseCase;
pub use search_ads_by_keyword::{SearchAdsByKeywordUseCase, SearchAdsResult};
pub use sync_products::{SyncProductsForPageUseCase, SyncProductsResult};
pub use watchlists::{ScanNowResult, WatchlistDetails, WatchlistsUseCase};
