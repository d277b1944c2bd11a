//! SQLite database handle and schema.
//!
//! One connection behind a parking_lot mutex, WAL mode for concurrent
//! reads during writes, prepared statement caching in the repositories.
//! The relational store is the sole authoritative state; the task queue
//! lives in the same file so workers coordinate through it.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
PRAGMA cache_size = -32000;
PRAGMA temp_store = MEMORY;

CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    state TEXT NOT NULL,
    country TEXT NOT NULL,
    language TEXT,
    currency TEXT,
    category TEXT,
    product_count INTEGER NOT NULL DEFAULT 0,
    is_commerce_platform INTEGER NOT NULL DEFAULT 0,
    commerce_profile_id TEXT,
    advertiser_page_id TEXT NOT NULL UNIQUE,
    active_ads_count INTEGER NOT NULL DEFAULT 0,
    total_ads_count INTEGER NOT NULL DEFAULT 0,
    score REAL,
    first_seen_at TEXT NOT NULL,
    last_scanned_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_country ON pages(country);
CREATE INDEX IF NOT EXISTS idx_pages_state ON pages(state);

CREATE TABLE IF NOT EXISTS ads (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    advertiser_page_id TEXT NOT NULL,
    meta_ad_id TEXT NOT NULL UNIQUE,
    title TEXT,
    body TEXT,
    link_url TEXT,
    image_url TEXT,
    video_url TEXT,
    cta_type TEXT,
    status TEXT NOT NULL,
    platforms TEXT NOT NULL DEFAULT '[]',
    countries TEXT NOT NULL DEFAULT '[]',
    started_at TEXT,
    ended_at TEXT,
    impressions_lower INTEGER,
    impressions_upper INTEGER,
    spend_lower REAL,
    spend_upper REAL,
    currency TEXT,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ads_page ON ads(page_id, status);

CREATE TABLE IF NOT EXISTS scans (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    scan_type TEXT NOT NULL,
    status TEXT NOT NULL,
    result_json TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0,
    max_retries INTEGER NOT NULL DEFAULT 3,
    error_message TEXT,
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scans_page ON scans(page_id, created_at DESC);

CREATE TABLE IF NOT EXISTS keyword_runs (
    id TEXT PRIMARY KEY,
    keyword TEXT NOT NULL,
    country TEXT NOT NULL,
    page_limit INTEGER NOT NULL,
    status TEXT NOT NULL,
    result_json TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    max_retries INTEGER NOT NULL DEFAULT 3,
    error_message TEXT,
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blacklisted_pages (
    advertiser_page_id TEXT PRIMARY KEY,
    reason TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shop_scores (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    score REAL NOT NULL,
    components_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_shop_scores_page ON shop_scores(page_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_shop_scores_rank ON shop_scores(score DESC, created_at DESC);

CREATE TABLE IF NOT EXISTS page_daily_metrics (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    date TEXT NOT NULL,
    ads_count INTEGER NOT NULL DEFAULT 0,
    shop_score REAL NOT NULL,
    products_count INTEGER,
    created_at TEXT NOT NULL,
    UNIQUE(page_id, date)
);

CREATE TABLE IF NOT EXISTS creative_analyses (
    id TEXT PRIMARY KEY,
    ad_id TEXT NOT NULL UNIQUE,
    creative_score REAL NOT NULL,
    style_tags TEXT NOT NULL DEFAULT '[]',
    angle_tags TEXT NOT NULL DEFAULT '[]',
    tone_tags TEXT NOT NULL DEFAULT '[]',
    sentiment TEXT NOT NULL,
    analyzer_version TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    old_score REAL,
    new_score REAL,
    old_tier TEXT,
    new_tier TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_page ON alerts(page_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at DESC);

CREATE TABLE IF NOT EXISTS commerce_profiles (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL UNIQUE,
    shop_name TEXT,
    theme TEXT,
    installed_apps TEXT NOT NULL DEFAULT '[]',
    payment_methods TEXT NOT NULL DEFAULT '[]',
    pixel_ids TEXT NOT NULL DEFAULT '[]',
    trust_score REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS watchlists (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS watchlist_items (
    id TEXT PRIMARY KEY,
    watchlist_id TEXT NOT NULL,
    page_id TEXT NOT NULL,
    added_at TEXT NOT NULL,
    UNIQUE(watchlist_id, page_id)
);

CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    handle TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT,
    price_min REAL,
    price_max REAL,
    currency TEXT,
    available INTEGER NOT NULL DEFAULT 1,
    tags TEXT NOT NULL DEFAULT '[]',
    vendor TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(page_id, handle)
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    args_json TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL DEFAULT 3,
    run_after TEXT NOT NULL,
    claimed_at TEXT,
    completed_at TEXT,
    error TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_ready ON tasks(status, run_after);
"#;

/// Shared SQLite handle used by every repository.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // we handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        Self::init(conn, db_path)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn, ":memory:")
    }

    fn init(conn: Connection, label: &str) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap_or_default();
        if label != ":memory:" && journal_mode.to_lowercase() != "wal" {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }

        info!("📊 Database initialized at: {}", label);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_cleanly() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'pages'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch(SCHEMA_SQL).unwrap();
    }

    #[test]
    fn file_backed_database_persists_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scope.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO blacklisted_pages (advertiser_page_id, reason, created_at) \
                     VALUES ('adv-1', 'spam', '2025-01-01T00:00:00+00:00')",
                    [],
                )
                .unwrap();
            let journal: String = db
                .conn()
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap();
            assert_eq!(journal.to_lowercase(), "wal");
        }

        let reopened = Database::open(path).unwrap();
        let count: i64 = reopened
            .conn()
            .query_row("SELECT COUNT(*) FROM blacklisted_pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
