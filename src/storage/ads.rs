//! Ad repository over SQLite. Batch upserts keyed on `meta_ad_id` run
//! inside one transaction.

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{Ad, AdPlatform, AdStatus, Country, DomainError, DomainResult};
use crate::ports::AdsRepository;

use super::database::Database;
use super::support::*;

pub struct SqliteAdsRepository {
    db: Database,
}

impl SqliteAdsRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_ad(row: &Row<'_>) -> rusqlite::Result<Ad> {
        let platforms: Vec<String> = from_json(&row.get::<_, String>("platforms")?);
        let countries: Vec<String> = from_json(&row.get::<_, String>("countries")?);
        let status: String = row.get("status")?;

        Ok(Ad {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            advertiser_page_id: row.get("advertiser_page_id")?,
            meta_ad_id: row.get("meta_ad_id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            link_url: row.get("link_url")?,
            image_url: row.get("image_url")?,
            video_url: row.get("video_url")?,
            cta_type: row.get("cta_type")?,
            status: AdStatus::parse(&status),
            platforms: platforms.iter().map(|p| AdPlatform::parse(p)).collect(),
            countries: countries
                .iter()
                .filter_map(|c| Country::parse(c).ok())
                .collect(),
            started_at: parse_opt_ts(row.get("started_at")?),
            ended_at: parse_opt_ts(row.get("ended_at")?),
            impressions_lower: row.get("impressions_lower")?,
            impressions_upper: row.get("impressions_upper")?,
            spend_lower: row.get("spend_lower")?,
            spend_upper: row.get("spend_upper")?,
            currency: row.get("currency")?,
            first_seen_at: parse_ts(&row.get::<_, String>("first_seen_at")?),
            last_seen_at: parse_ts(&row.get::<_, String>("last_seen_at")?),
        })
    }
}

const SELECT_COLUMNS: &str = "id, page_id, advertiser_page_id, meta_ad_id, title, body, \
link_url, image_url, video_url, cta_type, status, platforms, countries, started_at, \
ended_at, impressions_lower, impressions_upper, spend_lower, spend_upper, currency, \
first_seen_at, last_seen_at";

#[async_trait]
impl AdsRepository for SqliteAdsRepository {
    async fn save_many(&self, ads: &[Ad]) -> DomainResult<()> {
        if ads.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::repository("save_ads", e))?;

        for ad in ads {
            let platforms: Vec<&str> = ad.platforms.iter().map(|p| p.as_str()).collect();
            let countries: Vec<&str> = ad.countries.iter().map(|c| c.code()).collect();
            tx.execute(
                "INSERT INTO ads (id, page_id, advertiser_page_id, meta_ad_id, title, body, \
                 link_url, image_url, video_url, cta_type, status, platforms, countries, \
                 started_at, ended_at, impressions_lower, impressions_upper, spend_lower, \
                 spend_upper, currency, first_seen_at, last_seen_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                 ?16, ?17, ?18, ?19, ?20, ?21, ?22) \
                 ON CONFLICT(meta_ad_id) DO UPDATE SET \
                    title = excluded.title, \
                    body = excluded.body, \
                    link_url = excluded.link_url, \
                    image_url = excluded.image_url, \
                    video_url = excluded.video_url, \
                    cta_type = excluded.cta_type, \
                    status = excluded.status, \
                    platforms = excluded.platforms, \
                    countries = excluded.countries, \
                    started_at = excluded.started_at, \
                    ended_at = excluded.ended_at, \
                    impressions_lower = excluded.impressions_lower, \
                    impressions_upper = excluded.impressions_upper, \
                    spend_lower = excluded.spend_lower, \
                    spend_upper = excluded.spend_upper, \
                    currency = excluded.currency, \
                    last_seen_at = excluded.last_seen_at",
                params![
                    ad.id,
                    ad.page_id,
                    ad.advertiser_page_id,
                    ad.meta_ad_id,
                    ad.title,
                    ad.body,
                    ad.link_url,
                    ad.image_url,
                    ad.video_url,
                    ad.cta_type,
                    ad.status.as_str(),
                    to_json(&platforms),
                    to_json(&countries),
                    opt_ts(ad.started_at),
                    opt_ts(ad.ended_at),
                    ad.impressions_lower,
                    ad.impressions_upper,
                    ad.spend_lower,
                    ad.spend_upper,
                    ad.currency,
                    ts(ad.first_seen_at),
                    ts(ad.last_seen_at),
                ],
            )
            .map_err(|e| DomainError::repository("save_ads", e))?;
        }

        tx.commit()
            .map_err(|e| DomainError::repository("save_ads", e))
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Ad>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!("SELECT {} FROM ads WHERE id = ?1", SELECT_COLUMNS))
            .map_err(|e| DomainError::repository("get_ad", e))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_ad)
            .map_err(|e| DomainError::repository("get_ad", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_ad", e))
    }

    async fn list_by_page(&self, page_id: &str) -> DomainResult<Vec<Ad>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM ads WHERE page_id = ?1 ORDER BY first_seen_at ASC",
                SELECT_COLUMNS
            ))
            .map_err(|e| DomainError::repository("list_ads", e))?;
        let rows = stmt
            .query_map(params![page_id], Self::row_to_ad)
            .map_err(|e| DomainError::repository("list_ads", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_ads", e))
    }

    async fn count_active_by_page(&self, page_id: &str) -> DomainResult<u64> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM ads WHERE page_id = ?1 AND status = 'ACTIVE'",
            params![page_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c as u64)
        .map_err(|e| DomainError::repository("count_active_ads", e))
    }
}
