//! Ranked-shop read model use case.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{DomainResult, RankedShopsResult, RankingCriteria};
use crate::ports::ScoringRepository;

pub struct GetRankedShopsUseCase {
    scoring: Arc<dyn ScoringRepository>,
}

impl GetRankedShopsUseCase {
    pub fn new(scoring: Arc<dyn ScoringRepository>) -> Self {
        Self { scoring }
    }

    /// List + count run the same filters; weak consistency between the
    /// two queries is acceptable under concurrent writes.
    pub async fn execute(&self, criteria: RankingCriteria) -> DomainResult<RankedShopsResult> {
        info!(
            limit = criteria.limit,
            offset = criteria.offset,
            tier = ?criteria.tier,
            min_score = ?criteria.min_score,
            country = ?criteria.country.as_ref().map(|c| c.code()),
            "Getting ranked shops"
        );

        let items = self.scoring.list_ranked(&criteria).await?;
        let total = self.scoring.count_ranked(&criteria).await?;

        debug!(items = items.len(), total, "Ranked shops retrieved");

        Ok(RankedShopsResult {
            items,
            total,
            limit: criteria.limit,
            offset: criteria.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShopScore;
    use crate::usecases::fakes::InMemoryScoring;
    use crate::ports::ScoringRepository as _;
    use std::collections::BTreeMap;

    async fn seed(scoring: &InMemoryScoring) {
        for (page, score, country) in [
            ("p-1", 90.0, "FR"),
            ("p-2", 72.0, "US"),
            ("p-3", 60.0, "FR"),
            ("p-4", 30.0, "DE"),
        ] {
            scoring
                .save(&ShopScore::new(
                    format!("s-{}", page),
                    page.to_string(),
                    score,
                    BTreeMap::new(),
                ))
                .await
                .unwrap();
            scoring.page_info.lock().insert(
                page.to_string(),
                (format!("https://{}.com", page), country.to_string()),
            );
        }
    }

    #[tokio::test]
    async fn items_come_back_in_score_order_with_total() {
        let scoring = Arc::new(InMemoryScoring::default());
        seed(&scoring).await;

        let result = GetRankedShopsUseCase::new(scoring)
            .execute(RankingCriteria::default())
            .await
            .unwrap();

        assert_eq!(result.total, 4);
        let scores: Vec<f64> = result.items.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![90.0, 72.0, 60.0, 30.0]);
        assert!(!result.has_more());
    }

    #[tokio::test]
    async fn filters_compose_and_has_more_tracks_pagination() {
        let scoring = Arc::new(InMemoryScoring::default());
        seed(&scoring).await;

        let criteria =
            RankingCriteria::new(Some(1), Some(0), None, Some(50.0), Some("FR")).unwrap();
        let result = GetRankedShopsUseCase::new(scoring)
            .execute(criteria)
            .await
            .unwrap();

        // p-1 (90, FR) and p-3 (60, FR) match; limit 1 returns the best
        assert_eq!(result.total, 2);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].page_id, "p-1");
        assert!(result.has_more());
    }

    #[tokio::test]
    async fn tier_filter_uses_canonical_band() {
        let scoring = Arc::new(InMemoryScoring::default());
        seed(&scoring).await;

        let criteria = RankingCriteria::new(None, None, Some("XL"), None, None).unwrap();
        let result = GetRankedShopsUseCase::new(scoring)
            .execute(criteria)
            .await
            .unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].page_id, "p-2");
        assert_eq!(result.items[0].tier, "XL");
    }
}
