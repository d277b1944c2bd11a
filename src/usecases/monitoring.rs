//! Monitoring summary use case for the status dashboard.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::DomainResult;
use crate::ports::{AlertRepository, PageRepository, ScoringRepository};

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSummary {
    pub total_pages: u64,
    pub pages_with_scores: u64,
    pub alerts_last_24h: u32,
    pub alerts_last_7d: u32,
    pub generated_at: DateTime<Utc>,
}

pub struct GetMonitoringSummaryUseCase {
    pages: Arc<dyn PageRepository>,
    scoring: Arc<dyn ScoringRepository>,
    alerts: Arc<dyn AlertRepository>,
}

impl GetMonitoringSummaryUseCase {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        scoring: Arc<dyn ScoringRepository>,
        alerts: Arc<dyn AlertRepository>,
    ) -> Self {
        Self {
            pages,
            scoring,
            alerts,
        }
    }

    pub async fn execute(&self) -> DomainResult<MonitoringSummary> {
        let now = Utc::now();

        let pages = self.pages.list_all().await?;
        let total_pages = pages.len() as u64;

        let mut pages_with_scores = 0_u64;
        for page in &pages {
            if self.scoring.get_latest_by_page_id(&page.id).await?.is_some() {
                pages_with_scores += 1;
            }
        }

        let recent_alerts = self.alerts.list_recent(1000).await?;
        let cutoff_24h = now - Duration::hours(24);
        let cutoff_7d = now - Duration::days(7);
        let alerts_last_24h = recent_alerts
            .iter()
            .filter(|a| a.created_at >= cutoff_24h)
            .count() as u32;
        let alerts_last_7d = recent_alerts
            .iter()
            .filter(|a| a.created_at >= cutoff_7d)
            .count() as u32;

        info!(
            total_pages,
            pages_with_scores, alerts_last_24h, "Monitoring summary generated"
        );

        Ok(MonitoringSummary {
            total_pages,
            pages_with_scores,
            alerts_last_24h,
            alerts_last_7d,
            generated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Alert, AlertSeverity, AlertType, ShopScore};
    use crate::ports::{AlertRepository as _, PageRepository as _, ScoringRepository as _};
    use crate::usecases::fakes::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn summary_counts_pages_scores_and_alerts() {
        let pages = Arc::new(InMemoryPages::default());
        pages.save(&sample_page("p-1", "adv-1")).await.unwrap();
        pages.save(&sample_page("p-2", "adv-2")).await.unwrap();

        let scoring = Arc::new(InMemoryScoring::default());
        scoring
            .save(&ShopScore::new("s-1".into(), "p-1".into(), 55.0, BTreeMap::new()))
            .await
            .unwrap();

        let alerts = Arc::new(InMemoryAlerts::default());
        alerts
            .save(&Alert::new(
                "al-1".into(),
                "p-1".into(),
                AlertType::ScoreJump,
                AlertSeverity::Warning,
                "jump".into(),
            ))
            .await
            .unwrap();

        let summary = GetMonitoringSummaryUseCase::new(pages, scoring, alerts)
            .execute()
            .await
            .unwrap();

        assert_eq!(summary.total_pages, 2);
        assert_eq!(summary.pages_with_scores, 1);
        assert_eq!(summary.alerts_last_24h, 1);
        assert_eq!(summary.alerts_last_7d, 1);
    }
}
