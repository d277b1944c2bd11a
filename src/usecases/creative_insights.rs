//! Creative insight use cases.
//!
//! Per-ad analysis is idempotent (keyed by ad id, first write wins);
//! page-level insights aggregate the stored analyses.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Ad, CreativeAnalysis, DomainError, DomainResult, PageCreativeInsights};
use crate::ports::{
    AdsRepository, CreativeAnalysisRepository, CreativeTextAnalyzerPort, PageRepository,
};

/// Tags must appear in at least this many top creatives to be "common".
const COMMON_TAG_MIN_COUNT: usize = 2;

#[derive(Debug, Clone)]
pub struct AnalyzeAdCreativeResult {
    pub ad_id: String,
    pub analysis: CreativeAnalysis,
    pub was_cached: bool,
}

pub struct AnalyzeAdCreativeUseCase {
    analyses: Arc<dyn CreativeAnalysisRepository>,
    analyzer: Arc<dyn CreativeTextAnalyzerPort>,
}

impl AnalyzeAdCreativeUseCase {
    pub fn new(
        analyses: Arc<dyn CreativeAnalysisRepository>,
        analyzer: Arc<dyn CreativeTextAnalyzerPort>,
    ) -> Self {
        Self { analyses, analyzer }
    }

    pub async fn execute(&self, ad: &Ad) -> DomainResult<AnalyzeAdCreativeResult> {
        if let Some(existing) = self.analyses.get_by_ad_id(&ad.id).await? {
            debug!(ad_id = %ad.id, analysis_id = %existing.id, "Using cached creative analysis");
            return Ok(AnalyzeAdCreativeResult {
                ad_id: ad.id.clone(),
                analysis: existing,
                was_cached: true,
            });
        }

        let text = ad.creative_text();
        if text.trim().is_empty() {
            debug!(ad_id = %ad.id, "Ad has no text content, scoring empty creative");
        }

        let result = self.analyzer.analyze_text(&text);
        let analysis = CreativeAnalysis::new(
            Uuid::new_v4().to_string(),
            ad.id.clone(),
            result,
            self.analyzer.version(),
        );
        self.analyses.save(&analysis).await?;

        info!(
            ad_id = %ad.id,
            creative_score = analysis.creative_score,
            sentiment = analysis.sentiment.as_str(),
            "Ad creative analyzed"
        );

        Ok(AnalyzeAdCreativeResult {
            ad_id: ad.id.clone(),
            analysis,
            was_cached: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BuildPageCreativeInsightsResult {
    pub page_id: String,
    pub insights: PageCreativeInsights,
    pub ads_analyzed: u32,
    pub cached_analyses: u32,
    pub new_analyses: u32,
}

pub struct BuildPageCreativeInsightsUseCase {
    pages: Arc<dyn PageRepository>,
    ads: Arc<dyn AdsRepository>,
    analyze_ad: AnalyzeAdCreativeUseCase,
}

impl BuildPageCreativeInsightsUseCase {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        ads: Arc<dyn AdsRepository>,
        analyses: Arc<dyn CreativeAnalysisRepository>,
        analyzer: Arc<dyn CreativeTextAnalyzerPort>,
    ) -> Self {
        Self {
            pages,
            ads,
            analyze_ad: AnalyzeAdCreativeUseCase::new(analyses, analyzer),
        }
    }

    pub async fn execute(
        &self,
        page_id: &str,
        top_n: usize,
    ) -> DomainResult<BuildPageCreativeInsightsResult> {
        if self.pages.get(page_id).await?.is_none() {
            return Err(DomainError::not_found("Page", page_id));
        }

        let ads = self.ads.list_by_page(page_id).await?;
        if ads.is_empty() {
            info!(page_id = %page_id, "No ads found for page");
            return Ok(BuildPageCreativeInsightsResult {
                page_id: page_id.to_string(),
                insights: PageCreativeInsights::empty(page_id.to_string()),
                ads_analyzed: 0,
                cached_analyses: 0,
                new_analyses: 0,
            });
        }

        let mut analyses: Vec<CreativeAnalysis> = Vec::with_capacity(ads.len());
        let mut cached = 0_u32;
        let mut fresh = 0_u32;

        for ad in &ads {
            match self.analyze_ad.execute(ad).await {
                Ok(result) => {
                    if result.was_cached {
                        cached += 1;
                    } else {
                        fresh += 1;
                    }
                    analyses.push(result.analysis);
                }
                Err(err) => {
                    warn!(ad_id = %ad.id, error = %err, "Failed to analyze ad creative, skipping");
                }
            }
        }

        let insights = PageCreativeInsights::from_analyses(
            page_id.to_string(),
            analyses,
            top_n,
            COMMON_TAG_MIN_COUNT,
        );

        info!(
            page_id = %page_id,
            ads_analyzed = ads.len(),
            cached,
            fresh,
            avg_score = insights.avg_score,
            best_score = insights.best_score,
            "Page creative insights built"
        );

        Ok(BuildPageCreativeInsightsResult {
            page_id: page_id.to_string(),
            insights,
            ads_analyzed: ads.len() as u32,
            cached_analyses: cached,
            new_analyses: fresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fakes::*;

    fn ad(id: &str, title: &str) -> Ad {
        let mut ad = Ad::new(id.into(), "p-1".into(), "adv-1".into(), format!("m-{}", id));
        ad.title = Some(title.into());
        ad
    }

    #[tokio::test]
    async fn reanalyzing_returns_the_same_analysis_id() {
        let repo = Arc::new(InMemoryCreative::default());
        let use_case = AnalyzeAdCreativeUseCase::new(repo, Arc::new(FakeCreativeAnalyzer));
        let ad = ad("a-1", "Big sale today");

        let first = use_case.execute(&ad).await.unwrap();
        let second = use_case.execute(&ad).await.unwrap();

        assert!(!first.was_cached);
        assert!(second.was_cached);
        assert_eq!(first.analysis.id, second.analysis.id);
    }

    #[tokio::test]
    async fn insights_aggregate_over_page_ads() {
        let pages = Arc::new(InMemoryPages::with(sample_page("p-1", "adv-1")));
        let ads_repo = Arc::new(InMemoryAds::default());
        ads_repo
            .save_many(&[
                ad("a-1", "short"),
                ad("a-2", "a noticeably longer creative title here"),
            ])
            .await
            .unwrap();

        let result = BuildPageCreativeInsightsUseCase::new(
            pages,
            ads_repo,
            Arc::new(InMemoryCreative::default()),
            Arc::new(FakeCreativeAnalyzer),
        )
        .execute("p-1", 5)
        .await
        .unwrap();

        assert_eq!(result.ads_analyzed, 2);
        assert_eq!(result.new_analyses, 2);
        assert_eq!(result.insights.total_analyzed, 2);
        assert!(result.insights.best_score >= result.insights.avg_score);
        // "direct" tag comes from both analyses
        assert_eq!(result.insights.common_tags, vec!["direct".to_string()]);
    }

    #[tokio::test]
    async fn page_without_ads_yields_empty_insights() {
        let result = BuildPageCreativeInsightsUseCase::new(
            Arc::new(InMemoryPages::with(sample_page("p-1", "adv-1"))),
            Arc::new(InMemoryAds::default()),
            Arc::new(InMemoryCreative::default()),
            Arc::new(FakeCreativeAnalyzer),
        )
        .execute("p-1", 5)
        .await
        .unwrap();

        assert_eq!(result.ads_analyzed, 0);
        assert_eq!(result.insights.total_analyzed, 0);
    }

    #[tokio::test]
    async fn second_pass_uses_cached_analyses() {
        let pages = Arc::new(InMemoryPages::with(sample_page("p-1", "adv-1")));
        let ads_repo = Arc::new(InMemoryAds::default());
        ads_repo.save_many(&[ad("a-1", "hello")]).await.unwrap();
        let analyses = Arc::new(InMemoryCreative::default());

        let use_case = BuildPageCreativeInsightsUseCase::new(
            pages,
            ads_repo,
            analyses,
            Arc::new(FakeCreativeAnalyzer),
        );
        let first = use_case.execute("p-1", 5).await.unwrap();
        let second = use_case.execute("p-1", 5).await.unwrap();

        assert_eq!(first.new_analyses, 1);
        assert_eq!(second.new_analyses, 0);
        assert_eq!(second.cached_analyses, 1);
    }
}
