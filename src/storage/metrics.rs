//! Daily metrics repository. Upserts keyed on (page_id, date) make the
//! snapshot job idempotent per day.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::domain::{DomainError, DomainResult, PageDailyMetrics};
use crate::ports::PageMetricsRepository;

use super::database::Database;
use super::support::*;

pub struct SqlitePageMetricsRepository {
    db: Database,
}

impl SqlitePageMetricsRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_metric(row: &Row<'_>) -> rusqlite::Result<PageDailyMetrics> {
        Ok(PageDailyMetrics {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            date: parse_date(&row.get::<_, String>("date")?),
            ads_count: row.get::<_, i64>("ads_count")? as u32,
            shop_score: row.get("shop_score")?,
            products_count: row
                .get::<_, Option<i64>>("products_count")?
                .map(|c| c as u32),
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
        })
    }
}

#[async_trait]
impl PageMetricsRepository for SqlitePageMetricsRepository {
    async fn upsert_daily_metrics(&self, metrics: &[PageDailyMetrics]) -> DomainResult<()> {
        if metrics.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::repository("upsert_metrics", e))?;

        for metric in metrics {
            tx.execute(
                "INSERT INTO page_daily_metrics (id, page_id, date, ads_count, shop_score, \
                 products_count, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(page_id, date) DO UPDATE SET \
                    ads_count = excluded.ads_count, \
                    shop_score = excluded.shop_score, \
                    products_count = excluded.products_count",
                params![
                    metric.id,
                    metric.page_id,
                    metric.date.to_string(),
                    metric.ads_count as i64,
                    metric.shop_score,
                    metric.products_count.map(|c| c as i64),
                    ts(metric.created_at),
                ],
            )
            .map_err(|e| DomainError::repository("upsert_metrics", e))?;
        }

        tx.commit()
            .map_err(|e| DomainError::repository("upsert_metrics", e))
    }

    async fn list_page_metrics(
        &self,
        page_id: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        limit: u32,
    ) -> DomainResult<Vec<PageDailyMetrics>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, page_id, date, ads_count, shop_score, products_count, created_at \
                 FROM page_daily_metrics \
                 WHERE page_id = ?1 \
                   AND (?2 IS NULL OR date >= ?2) \
                   AND (?3 IS NULL OR date <= ?3) \
                 ORDER BY date ASC LIMIT ?4",
            )
            .map_err(|e| DomainError::repository("list_metrics", e))?;
        let rows = stmt
            .query_map(
                params![
                    page_id,
                    date_from.map(|d| d.to_string()),
                    date_to.map(|d| d.to_string()),
                    limit as i64,
                ],
                Self::row_to_metric,
            )
            .map_err(|e| DomainError::repository("list_metrics", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_metrics", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(id: &str, date: &str, score: f64) -> PageDailyMetrics {
        PageDailyMetrics::new(
            id.into(),
            "p-1".into(),
            date.parse().unwrap(),
            8,
            score,
            Some(40),
        )
    }

    #[tokio::test]
    async fn save_then_reload_round_trips() {
        let repo = SqlitePageMetricsRepository::new(Database::open_in_memory().unwrap());
        repo.upsert_daily_metrics(&[metric("m-1", "2025-07-01", 62.5)])
            .await
            .unwrap();

        let rows = repo
            .list_page_metrics("p-1", None, None, 90)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shop_score, 62.5);
        assert_eq!(rows[0].ads_count, 8);
        assert_eq!(rows[0].products_count, Some(40));
        assert_eq!(rows[0].date.to_string(), "2025-07-01");
    }

    #[tokio::test]
    async fn second_snapshot_same_day_overwrites() {
        let repo = SqlitePageMetricsRepository::new(Database::open_in_memory().unwrap());
        repo.upsert_daily_metrics(&[metric("m-1", "2025-07-01", 60.0)])
            .await
            .unwrap();
        repo.upsert_daily_metrics(&[metric("m-2", "2025-07-01", 65.0)])
            .await
            .unwrap();

        let rows = repo
            .list_page_metrics("p-1", None, None, 90)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shop_score, 65.0);
    }

    #[tokio::test]
    async fn date_range_and_ordering() {
        let repo = SqlitePageMetricsRepository::new(Database::open_in_memory().unwrap());
        repo.upsert_daily_metrics(&[
            metric("m-3", "2025-07-03", 60.0),
            metric("m-1", "2025-07-01", 50.0),
            metric("m-2", "2025-07-02", 55.0),
        ])
        .await
        .unwrap();

        let rows = repo
            .list_page_metrics(
                "p-1",
                Some("2025-07-02".parse().unwrap()),
                Some("2025-07-03".parse().unwrap()),
                90,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.to_string(), "2025-07-02");
        assert_eq!(rows[1].date.to_string(), "2025-07-03");
    }
}
