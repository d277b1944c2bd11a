//! Page repository over SQLite.

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{
    Category, Country, Currency, DomainError, DomainResult, Language, Page, PageStatus,
    ProductCount, Url,
};
use crate::ports::PageRepository;

use super::database::Database;
use super::support::*;

pub struct SqlitePageRepository {
    db: Database,
}

impl SqlitePageRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_page(row: &Row<'_>) -> rusqlite::Result<Page> {
        let url_str: String = row.get("url")?;
        let country_str: String = row.get("country")?;
        let state_str: String = row.get("state")?;

        let url = Url::parse(&url_str)
            .unwrap_or_else(|_| Url::parse("https://invalid.example").expect("static url"));
        let domain = url.domain();

        Ok(Page {
            id: row.get("id")?,
            url,
            domain,
            state: PageStatus::parse(&state_str).unwrap_or(PageStatus::Discovered),
            country: Country::parse(&country_str).unwrap_or_else(|_| {
                Country::parse("US").expect("static country")
            }),
            language: row
                .get::<_, Option<String>>("language")?
                .and_then(|l| Language::parse(&l).ok()),
            currency: row
                .get::<_, Option<String>>("currency")?
                .and_then(|c| Currency::parse(&c).ok()),
            category: row
                .get::<_, Option<String>>("category")?
                .and_then(|c| Category::parse(&c).ok()),
            product_count: ProductCount::new(row.get::<_, i64>("product_count")?)
                .unwrap_or_else(|_| ProductCount::zero()),
            is_commerce_platform: row.get::<_, i64>("is_commerce_platform")? != 0,
            commerce_profile_id: row.get("commerce_profile_id")?,
            advertiser_page_id: row.get("advertiser_page_id")?,
            active_ads_count: row.get::<_, i64>("active_ads_count")? as u32,
            total_ads_count: row.get::<_, i64>("total_ads_count")? as u32,
            score: row.get("score")?,
            first_seen_at: parse_ts(&row.get::<_, String>("first_seen_at")?),
            last_scanned_at: parse_opt_ts(row.get("last_scanned_at")?),
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
            updated_at: parse_ts(&row.get::<_, String>("updated_at")?),
        })
    }
}

const SELECT_COLUMNS: &str = "id, url, domain, state, country, language, currency, category, \
product_count, is_commerce_platform, commerce_profile_id, advertiser_page_id, \
active_ads_count, total_ads_count, score, first_seen_at, last_scanned_at, \
created_at, updated_at";

#[async_trait]
impl PageRepository for SqlitePageRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<Page>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!("SELECT {} FROM pages WHERE id = ?1", SELECT_COLUMNS))
            .map_err(|e| DomainError::repository("get_page", e))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_page)
            .map_err(|e| DomainError::repository("get_page", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_page", e))
    }

    async fn get_by_advertiser_page_id(
        &self,
        advertiser_page_id: &str,
    ) -> DomainResult<Option<Page>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM pages WHERE advertiser_page_id = ?1",
                SELECT_COLUMNS
            ))
            .map_err(|e| DomainError::repository("get_page_by_advertiser", e))?;
        let mut rows = stmt
            .query_map(params![advertiser_page_id], Self::row_to_page)
            .map_err(|e| DomainError::repository("get_page_by_advertiser", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_page_by_advertiser", e))
    }

    async fn save(&self, page: &Page) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO pages (id, url, domain, state, country, language, currency, category, \
             product_count, is_commerce_platform, commerce_profile_id, advertiser_page_id, \
             active_ads_count, total_ads_count, score, first_seen_at, last_scanned_at, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19) \
             ON CONFLICT(id) DO UPDATE SET \
                url = excluded.url, \
                domain = excluded.domain, \
                state = excluded.state, \
                country = excluded.country, \
                language = excluded.language, \
                currency = excluded.currency, \
                category = excluded.category, \
                product_count = excluded.product_count, \
                is_commerce_platform = excluded.is_commerce_platform, \
                commerce_profile_id = excluded.commerce_profile_id, \
                active_ads_count = excluded.active_ads_count, \
                total_ads_count = excluded.total_ads_count, \
                score = excluded.score, \
                last_scanned_at = excluded.last_scanned_at, \
                updated_at = excluded.updated_at",
            params![
                page.id,
                page.url.as_str(),
                page.domain,
                page.state.as_str(),
                page.country.code(),
                page.language.as_ref().map(|l| l.code().to_string()),
                page.currency.as_ref().map(|c| c.code().to_string()),
                page.category.as_ref().map(|c| c.as_str().to_string()),
                page.product_count.value() as i64,
                page.is_commerce_platform as i64,
                page.commerce_profile_id,
                page.advertiser_page_id,
                page.active_ads_count as i64,
                page.total_ads_count as i64,
                page.score,
                ts(page.first_seen_at),
                opt_ts(page.last_scanned_at),
                ts(page.created_at),
                ts(page.updated_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_page", e))?;
        Ok(())
    }

    async fn list_all(&self) -> DomainResult<Vec<Page>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM pages ORDER BY created_at ASC",
                SELECT_COLUMNS
            ))
            .map_err(|e| DomainError::repository("list_pages", e))?;
        let rows = stmt
            .query_map([], Self::row_to_page)
            .map_err(|e| DomainError::repository("list_pages", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_pages", e))
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Vec<Page>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM pages ORDER BY created_at ASC LIMIT ?1 OFFSET ?2",
                SELECT_COLUMNS
            ))
            .map_err(|e| DomainError::repository("list_pages", e))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_page)
            .map_err(|e| DomainError::repository("list_pages", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_pages", e))
    }

    async fn count(&self) -> DomainResult<u64> {
        let conn = self.db.conn();
        conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get::<_, i64>(0))
            .map(|c| c as u64)
            .map_err(|e| DomainError::repository("count_pages", e))
    }
}
