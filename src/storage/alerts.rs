//! Alert repository - append-only event rows.

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{Alert, AlertSeverity, AlertType, DomainError, DomainResult};
use crate::ports::AlertRepository;

use super::database::Database;
use super::support::*;

pub struct SqliteAlertRepository {
    db: Database,
}

impl SqliteAlertRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_alert(row: &Row<'_>) -> rusqlite::Result<Alert> {
        let alert_type: String = row.get("alert_type")?;
        let severity: String = row.get("severity")?;
        Ok(Alert {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            alert_type: AlertType::parse(&alert_type).unwrap_or(AlertType::ScoreJump),
            severity: AlertSeverity::parse(&severity),
            message: row.get("message")?,
            old_score: row.get("old_score")?,
            new_score: row.get("new_score")?,
            old_tier: row.get("old_tier")?,
            new_tier: row.get("new_tier")?,
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
        })
    }
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn save(&self, alert: &Alert) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO alerts (id, page_id, alert_type, severity, message, old_score, \
             new_score, old_tier, new_tier, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                alert.id,
                alert.page_id,
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.message,
                alert.old_score,
                alert.new_score,
                alert.old_tier,
                alert.new_tier,
                ts(alert.created_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_alert", e))?;
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> DomainResult<Vec<Alert>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM alerts ORDER BY created_at DESC LIMIT ?1",
            )
            .map_err(|e| DomainError::repository("list_alerts", e))?;
        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_alert)
            .map_err(|e| DomainError::repository("list_alerts", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_alerts", e))
    }

    async fn list_by_page(
        &self,
        page_id: &str,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<Alert>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM alerts WHERE page_id = ?1 \
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| DomainError::repository("list_alerts", e))?;
        let rows = stmt
            .query_map(params![page_id, limit as i64, offset as i64], Self::row_to_alert)
            .map_err(|e| DomainError::repository("list_alerts", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_alerts", e))
    }
}
