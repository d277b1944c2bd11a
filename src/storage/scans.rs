//! Scan, keyword-run and blacklist repositories.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::domain::{
    Country, DomainError, DomainResult, KeywordRun, KeywordRunResult, KeywordRunStatus, Scan,
    ScanId, ScanResult, ScanStatus, ScanType,
};
use crate::ports::{BlacklistRepository, KeywordRunRepository, ScanRepository};

use super::database::Database;
use super::support::*;

pub struct SqliteScanRepository {
    db: Database,
}

impl SqliteScanRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_scan(row: &Row<'_>) -> rusqlite::Result<Scan> {
        let id: String = row.get("id")?;
        let scan_type: String = row.get("scan_type")?;
        let status: String = row.get("status")?;
        let result: Option<ScanResult> = opt_from_json(row.get("result_json")?);

        Ok(Scan {
            id: ScanId::parse(&id).unwrap_or_else(|_| ScanId::generate()),
            page_id: row.get("page_id")?,
            scan_type: ScanType::parse(&scan_type).unwrap_or(ScanType::Full),
            status: ScanStatus::parse(&status).unwrap_or(ScanStatus::Pending),
            result,
            priority: row.get("priority")?,
            retry_count: row.get::<_, i64>("retry_count")? as u32,
            max_retries: row.get::<_, i64>("max_retries")? as u32,
            error_message: row.get("error_message")?,
            started_at: parse_opt_ts(row.get("started_at")?),
            completed_at: parse_opt_ts(row.get("completed_at")?),
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
            updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
        })
    }
}

#[async_trait]
impl ScanRepository for SqliteScanRepository {
    async fn save(&self, scan: &Scan) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO scans (id, page_id, scan_type, status, result_json, priority, \
             retry_count, max_retries, error_message, started_at, completed_at, created_at, \
             updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(id) DO UPDATE SET \
                status = excluded.status, \
                result_json = excluded.result_json, \
                retry_count = excluded.retry_count, \
                error_message = excluded.error_message, \
                started_at = excluded.started_at, \
                completed_at = excluded.completed_at, \
                updated_at = excluded.updated_at",
            params![
                scan.id.to_string(),
                scan.page_id,
                scan.scan_type.as_str(),
                scan.status.as_str(),
                scan.result.as_ref().map(to_json),
                scan.priority,
                scan.retry_count as i64,
                scan.max_retries as i64,
                scan.error_message,
                opt_ts(scan.started_at),
                opt_ts(scan.completed_at),
                ts(scan.created_at),
                ts(scan.updated_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_scan", e))?;
        Ok(())
    }

    async fn get(&self, id: ScanId) -> DomainResult<Option<Scan>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM scans WHERE id = ?1")
            .map_err(|e| DomainError::repository("get_scan", e))?;
        let mut rows = stmt
            .query_map(params![id.to_string()], Self::row_to_scan)
            .map_err(|e| DomainError::repository("get_scan", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_scan", e))
    }
}

pub struct SqliteKeywordRunRepository {
    db: Database,
}

impl SqliteKeywordRunRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<KeywordRun> {
        let country: String = row.get("country")?;
        let status: String = row.get("status")?;
        let result: Option<KeywordRunResult> = opt_from_json(row.get("result_json")?);

        Ok(KeywordRun {
            id: row.get("id")?,
            keyword: row.get("keyword")?,
            country: Country::parse(&country)
                .unwrap_or_else(|_| Country::parse("US").expect("static country")),
            page_limit: row.get::<_, i64>("page_limit")? as u32,
            status: KeywordRunStatus::parse(&status).unwrap_or(KeywordRunStatus::Pending),
            result,
            retry_count: row.get::<_, i64>("retry_count")? as u32,
            max_retries: row.get::<_, i64>("max_retries")? as u32,
            error_message: row.get("error_message")?,
            started_at: parse_opt_ts(row.get("started_at")?),
            completed_at: parse_opt_ts(row.get("completed_at")?),
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
            updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
        })
    }
}

#[async_trait]
impl KeywordRunRepository for SqliteKeywordRunRepository {
    async fn save(&self, run: &KeywordRun) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO keyword_runs (id, keyword, country, page_limit, status, result_json, \
             retry_count, max_retries, error_message, started_at, completed_at, created_at, \
             updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(id) DO UPDATE SET \
                status = excluded.status, \
                result_json = excluded.result_json, \
                retry_count = excluded.retry_count, \
                error_message = excluded.error_message, \
                started_at = excluded.started_at, \
                completed_at = excluded.completed_at, \
                updated_at = excluded.updated_at",
            params![
                run.id,
                run.keyword,
                run.country.code(),
                run.page_limit as i64,
                run.status.as_str(),
                run.result.as_ref().map(to_json),
                run.retry_count as i64,
                run.max_retries as i64,
                run.error_message,
                opt_ts(run.started_at),
                opt_ts(run.completed_at),
                ts(run.created_at),
                ts(run.updated_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_keyword_run", e))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<KeywordRun>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM keyword_runs WHERE id = ?1")
            .map_err(|e| DomainError::repository("get_keyword_run", e))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_run)
            .map_err(|e| DomainError::repository("get_keyword_run", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_keyword_run", e))
    }
}

pub struct SqliteBlacklistRepository {
    db: Database,
}

impl SqliteBlacklistRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlacklistRepository for SqliteBlacklistRepository {
    async fn is_blacklisted(&self, advertiser_page_id: &str) -> DomainResult<bool> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM blacklisted_pages WHERE advertiser_page_id = ?1",
            params![advertiser_page_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .map_err(|e| DomainError::repository("is_blacklisted", e))
    }

    async fn add(&self, advertiser_page_id: &str, reason: Option<&str>) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT OR IGNORE INTO blacklisted_pages (advertiser_page_id, reason, created_at) \
             VALUES (?1, ?2, ?3)",
            params![advertiser_page_id, reason, ts(Utc::now())],
        )
        .map_err(|e| DomainError::repository("add_blacklist", e))?;
        Ok(())
    }
}
