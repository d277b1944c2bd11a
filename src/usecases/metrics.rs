//! Metrics historisation use cases.
//!
//! Daily snapshot of per-page metrics keyed by (page_id, date), and the
//! bounded history query feeding the time-series endpoints.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    DomainError, DomainResult, Page, PageDailyMetrics, PageMetricsHistoryResult,
};
use crate::ports::{PageMetricsRepository, PageRepository, ProductRepository, ScoringRepository};

/// Hard cap on history length regardless of caller intent (~3 months).
pub const MAX_HISTORY_DAYS: u32 = 90;

#[derive(Debug, Clone, Copy)]
pub struct RecordDailyMetricsResult {
    pub snapshot_date: NaiveDate,
    pub pages_processed: u32,
    pub snapshots_written: u32,
    pub errors_count: u32,
}

pub struct RecordDailyMetricsForAllPagesUseCase {
    pages: Arc<dyn PageRepository>,
    scoring: Arc<dyn ScoringRepository>,
    products: Arc<dyn ProductRepository>,
    metrics: Arc<dyn PageMetricsRepository>,
}

impl RecordDailyMetricsForAllPagesUseCase {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        scoring: Arc<dyn ScoringRepository>,
        products: Arc<dyn ProductRepository>,
        metrics: Arc<dyn PageMetricsRepository>,
    ) -> Self {
        Self {
            pages,
            scoring,
            products,
            metrics,
        }
    }

    pub async fn execute(
        &self,
        snapshot_date: Option<NaiveDate>,
    ) -> DomainResult<RecordDailyMetricsResult> {
        let snapshot_date = snapshot_date.unwrap_or_else(|| Utc::now().date_naive());

        info!(snapshot_date = %snapshot_date, "Starting daily metrics recording");

        let pages = self.pages.list_all().await?;
        let pages_processed = pages.len() as u32;

        let mut to_write: Vec<PageDailyMetrics> = Vec::new();
        let mut errors_count = 0_u32;

        for page in &pages {
            match self.build_metric(page, snapshot_date).await {
                Ok(Some(metric)) => to_write.push(metric),
                Ok(None) => {}
                Err(err) => {
                    errors_count += 1;
                    warn!(page_id = %page.id, error = %err, "Failed to build metrics for page");
                }
            }
        }

        if !to_write.is_empty() {
            self.metrics.upsert_daily_metrics(&to_write).await?;
        }

        let snapshots_written = to_write.len() as u32;
        info!(
            snapshot_date = %snapshot_date,
            pages_processed,
            snapshots_written,
            errors_count,
            "Daily metrics recording completed"
        );

        Ok(RecordDailyMetricsResult {
            snapshot_date,
            pages_processed,
            snapshots_written,
            errors_count,
        })
    }

    /// None when the page has no score yet; those pages are skipped.
    async fn build_metric(
        &self,
        page: &Page,
        snapshot_date: NaiveDate,
    ) -> DomainResult<Option<PageDailyMetrics>> {
        let latest_score = match self.scoring.get_latest_by_page_id(&page.id).await? {
            Some(score) => score,
            None => {
                debug!(page_id = %page.id, "Skipping page without score");
                return Ok(None);
            }
        };

        // Products count is best-effort, never fails the snapshot.
        let products_count = match self.products.count_by_page(&page.id).await {
            Ok(count) => Some(count as u32),
            Err(_) => None,
        };

        Ok(Some(PageDailyMetrics::new(
            Uuid::new_v4().to_string(),
            page.id.clone(),
            snapshot_date,
            page.active_ads_count,
            latest_score.score,
            products_count,
        )))
    }
}

pub struct GetPageMetricsHistoryUseCase {
    pages: Arc<dyn PageRepository>,
    metrics: Arc<dyn PageMetricsRepository>,
}

impl GetPageMetricsHistoryUseCase {
    pub fn new(pages: Arc<dyn PageRepository>, metrics: Arc<dyn PageMetricsRepository>) -> Self {
        Self { pages, metrics }
    }

    pub async fn execute(
        &self,
        page_id: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        limit: Option<u32>,
    ) -> DomainResult<PageMetricsHistoryResult> {
        if self.pages.get(page_id).await?.is_none() {
            return Err(DomainError::not_found("Page", page_id));
        }

        let limit = limit.unwrap_or(MAX_HISTORY_DAYS).min(MAX_HISTORY_DAYS);

        let metrics = self
            .metrics
            .list_page_metrics(page_id, date_from, date_to, limit)
            .await?;

        debug!(page_id = %page_id, metrics_count = metrics.len(), "Page metrics history retrieved");

        Ok(PageMetricsHistoryResult {
            page_id: page_id.to_string(),
            metrics,
        })
    }
}
