//! Shop score repository and the ranked-shop read model.
//!
//! Scores are append-only rows; the ranked queries join each page's
//! latest score with page info. Tier filters are translated to score
//! ranges through the canonical tier table, never re-derived here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

use crate::domain::tiering;
use crate::domain::{DomainError, DomainResult, RankedShop, RankingCriteria, ShopScore};
use crate::ports::ScoringRepository;

use super::database::Database;
use super::support::*;

pub struct SqliteScoringRepository {
    db: Database,
}

/// Joined latest-score-per-page relation the ranked queries run over.
const RANKED_FROM: &str = "FROM shop_scores s \
JOIN (SELECT page_id, MAX(created_at) AS max_created FROM shop_scores GROUP BY page_id) latest \
    ON latest.page_id = s.page_id AND latest.max_created = s.created_at \
JOIN pages p ON p.id = s.page_id";

impl SqliteScoringRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_score(row: &Row<'_>) -> rusqlite::Result<ShopScore> {
        let components: BTreeMap<String, f64> = from_json(&row.get::<_, String>("components_json")?);
        Ok(ShopScore {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            score: row.get("score")?,
            components,
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
        })
    }

    /// WHERE clause + params for the composed ranking filters.
    fn ranking_filters(criteria: &RankingCriteria) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(min_score) = criteria.min_score {
            clauses.push(format!("s.score >= ?{}", values.len() + 1));
            values.push(Value::Real(min_score));
        }

        if let Some((lower, upper)) = criteria.tier_score_range() {
            clauses.push(format!("s.score >= ?{}", values.len() + 1));
            values.push(Value::Real(lower));
            // XXL's upper bound is inclusive at 100
            if criteria.tier.as_deref() != Some("XXL") {
                clauses.push(format!("s.score < ?{}", values.len() + 1));
                values.push(Value::Real(upper));
            }
        }

        if let Some(country) = &criteria.country {
            clauses.push(format!("p.country = ?{}", values.len() + 1));
            values.push(Value::Text(country.code().to_string()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (where_clause, values)
    }
}

#[async_trait]
impl ScoringRepository for SqliteScoringRepository {
    async fn save(&self, score: &ShopScore) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO shop_scores (id, page_id, score, components_json, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                score.id,
                score.page_id,
                score.score,
                to_json(&score.components),
                ts(score.created_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_score", e))?;
        Ok(())
    }

    async fn get_latest_by_page_id(&self, page_id: &str) -> DomainResult<Option<ShopScore>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, page_id, score, components_json, created_at FROM shop_scores \
                 WHERE page_id = ?1 ORDER BY created_at DESC LIMIT 1",
            )
            .map_err(|e| DomainError::repository("get_latest_score", e))?;
        let mut rows = stmt
            .query_map(params![page_id], Self::row_to_score)
            .map_err(|e| DomainError::repository("get_latest_score", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_latest_score", e))
    }

    async fn list_by_page(&self, page_id: &str, limit: u32) -> DomainResult<Vec<ShopScore>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, page_id, score, components_json, created_at FROM shop_scores \
                 WHERE page_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            )
            .map_err(|e| DomainError::repository("list_scores", e))?;
        let rows = stmt
            .query_map(params![page_id, limit as i64], Self::row_to_score)
            .map_err(|e| DomainError::repository("list_scores", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_scores", e))
    }

    async fn list_ranked(&self, criteria: &RankingCriteria) -> DomainResult<Vec<RankedShop>> {
        let (where_clause, mut values) = Self::ranking_filters(criteria);
        let sql = format!(
            "SELECT s.page_id, s.score, s.created_at, p.url, p.country, p.domain \
             {} {} ORDER BY s.score DESC, s.created_at DESC LIMIT ?{} OFFSET ?{}",
            RANKED_FROM,
            where_clause,
            values.len() + 1,
            values.len() + 2,
        );
        values.push(Value::Integer(criteria.limit as i64));
        values.push(Value::Integer(criteria.offset as i64));

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::repository("list_ranked", e))?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let score: f64 = row.get("score")?;
                Ok(RankedShop {
                    page_id: row.get("page_id")?,
                    score,
                    tier: tiering::score_to_tier(score).to_string(),
                    url: row.get("url")?,
                    country: row.get("country")?,
                    name: row.get("domain")?,
                })
            })
            .map_err(|e| DomainError::repository("list_ranked", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::repository("list_ranked", e))
    }

    async fn count_ranked(&self, criteria: &RankingCriteria) -> DomainResult<u64> {
        let (where_clause, values) = Self::ranking_filters(criteria);
        let sql = format!("SELECT COUNT(*) {} {}", RANKED_FROM, where_clause);

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::repository("count_ranked", e))?;
        stmt.query_row(params_from_iter(values), |row| row.get::<_, i64>(0))
            .map(|c| c as u64)
            .map_err(|e| DomainError::repository("count_ranked", e))
    }
}
