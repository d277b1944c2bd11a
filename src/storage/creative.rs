//! Creative analysis repository. Unique on ad_id with first-write-wins
//! inserts, which makes re-analysis idempotent.

use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::domain::{CreativeAnalysis, DomainError, DomainResult, Sentiment};
use crate::ports::CreativeAnalysisRepository;

use super::database::Database;
use super::support::*;

pub struct SqliteCreativeAnalysisRepository {
    db: Database,
}

impl SqliteCreativeAnalysisRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_analysis(row: &Row<'_>) -> rusqlite::Result<CreativeAnalysis> {
        let sentiment: String = row.get("sentiment")?;
        Ok(CreativeAnalysis {
            id: row.get("id")?,
            ad_id: row.get("ad_id")?,
            creative_score: row.get("creative_score")?,
            style_tags: from_json(&row.get::<_, String>("style_tags")?),
            angle_tags: from_json(&row.get::<_, String>("angle_tags")?),
            tone_tags: from_json(&row.get::<_, String>("tone_tags")?),
            sentiment: Sentiment::parse(&sentiment),
            analyzer_version: row.get("analyzer_version")?,
            created_at: parse_ts(&row.get::<_, String>("created_at")?),
        })
    }
}

#[async_trait]
impl CreativeAnalysisRepository for SqliteCreativeAnalysisRepository {
    async fn get_by_ad_id(&self, ad_id: &str) -> DomainResult<Option<CreativeAnalysis>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM creative_analyses WHERE ad_id = ?1")
            .map_err(|e| DomainError::repository("get_analysis", e))?;
        let mut rows = stmt
            .query_map(params![ad_id], Self::row_to_analysis)
            .map_err(|e| DomainError::repository("get_analysis", e))?;
        rows.next()
            .transpose()
            .map_err(|e| DomainError::repository("get_analysis", e))
    }

    async fn save(&self, analysis: &CreativeAnalysis) -> DomainResult<()> {
        let conn = self.db.conn();
        // first write wins
        conn.execute(
            "INSERT OR IGNORE INTO creative_analyses (id, ad_id, creative_score, style_tags, \
             angle_tags, tone_tags, sentiment, analyzer_version, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                analysis.id,
                analysis.ad_id,
                analysis.creative_score,
                to_json(&analysis.style_tags),
                to_json(&analysis.angle_tags),
                to_json(&analysis.tone_tags),
                analysis.sentiment.as_str(),
                analysis.analyzer_version,
                ts(analysis.created_at),
            ],
        )
        .map_err(|e| DomainError::repository("save_analysis", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreativeTextAnalysis;

    fn analysis(id: &str, ad_id: &str, score: f64) -> CreativeAnalysis {
        CreativeAnalysis::new(
            id.into(),
            ad_id.into(),
            CreativeTextAnalysis {
                creative_score: score,
                style_tags: vec!["bold".into()],
                angle_tags: vec!["urgency".into()],
                tone_tags: vec![],
                sentiment: Sentiment::Positive,
            },
            "v1.0",
        )
    }

    #[tokio::test]
    async fn save_then_reload_round_trips() {
        let repo = SqliteCreativeAnalysisRepository::new(Database::open_in_memory().unwrap());
        repo.save(&analysis("ca-1", "ad-1", 72.0)).await.unwrap();

        let loaded = repo.get_by_ad_id("ad-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "ca-1");
        assert_eq!(loaded.creative_score, 72.0);
        assert_eq!(loaded.style_tags, vec!["bold".to_string()]);
        assert_eq!(loaded.sentiment, Sentiment::Positive);
        assert_eq!(loaded.analyzer_version, "v1.0");
    }

    #[tokio::test]
    async fn first_write_wins_per_ad() {
        let repo = SqliteCreativeAnalysisRepository::new(Database::open_in_memory().unwrap());
        repo.save(&analysis("ca-1", "ad-1", 72.0)).await.unwrap();
        repo.save(&analysis("ca-2", "ad-1", 10.0)).await.unwrap();

        let loaded = repo.get_by_ad_id("ad-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "ca-1");
        assert_eq!(loaded.creative_score, 72.0);
    }
}
