//! PageDailyMetrics entity - one snapshot per (page, date).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tiering;

/// Daily metrics snapshot, unique on (page_id, date). Upserted so a
/// re-run of the snapshot job for the same date overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDailyMetrics {
    pub id: String,
    pub page_id: String,
    pub date: NaiveDate,
    pub ads_count: u32,
    pub shop_score: f64,
    pub products_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl PageDailyMetrics {
    pub fn new(
        id: String,
        page_id: String,
        date: NaiveDate,
        ads_count: u32,
        shop_score: f64,
        products_count: Option<u32>,
    ) -> Self {
        Self {
            id,
            page_id,
            date,
            ads_count,
            shop_score: shop_score.clamp(0.0, 100.0),
            products_count,
            created_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> &'static str {
        tiering::score_to_tier(self.shop_score)
    }
}

impl PartialEq for PageDailyMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PageDailyMetrics {}

/// Metrics history for one page, ordered by date ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetricsHistoryResult {
    pub page_id: String,
    pub metrics: Vec<PageDailyMetrics>,
}

impl PageMetricsHistoryResult {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.metrics.first().map(|m| m.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.metrics.last().map(|m| m.date)
    }

    /// Last score minus first score over the window.
    pub fn score_trend(&self) -> Option<f64> {
        match (self.metrics.first(), self.metrics.last()) {
            (Some(first), Some(last)) => Some(last.shop_score - first.shop_score),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(date: &str, score: f64) -> PageDailyMetrics {
        PageDailyMetrics::new(
            format!("m-{}", date),
            "p-1".into(),
            date.parse().unwrap(),
            10,
            score,
            Some(40),
        )
    }

    #[test]
    fn trend_is_last_minus_first() {
        let history = PageMetricsHistoryResult {
            page_id: "p-1".into(),
            metrics: vec![
                metric("2025-06-01", 40.0),
                metric("2025-06-02", 45.5),
                metric("2025-06-03", 52.0),
            ],
        };
        assert_eq!(history.first_date().unwrap().to_string(), "2025-06-01");
        assert_eq!(history.last_date().unwrap().to_string(), "2025-06-03");
        assert_eq!(history.score_trend(), Some(12.0));
    }

    #[test]
    fn empty_history_has_no_trend() {
        let history = PageMetricsHistoryResult {
            page_id: "p-1".into(),
            metrics: vec![],
        };
        assert_eq!(history.score_trend(), None);
    }

    #[test]
    fn snapshot_tier_follows_score() {
        assert_eq!(metric("2025-06-01", 86.0).tier(), "XXL");
        assert_eq!(metric("2025-06-01", 10.0).tier(), "XS");
    }
}
