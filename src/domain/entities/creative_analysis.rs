//! CreativeAnalysis entity and page-level insight aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

/// Raw output of the creative text analyzer, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeTextAnalysis {
    pub creative_score: f64,
    pub style_tags: Vec<String>,
    pub angle_tags: Vec<String>,
    pub tone_tags: Vec<String>,
    pub sentiment: Sentiment,
}

/// One stored analysis per ad (idempotent: first write wins, keyed by
/// ad id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeAnalysis {
    pub id: String,
    pub ad_id: String,
    pub creative_score: f64,
    pub style_tags: Vec<String>,
    pub angle_tags: Vec<String>,
    pub tone_tags: Vec<String>,
    pub sentiment: Sentiment,
    pub analyzer_version: String,
    pub created_at: DateTime<Utc>,
}

impl CreativeAnalysis {
    pub fn new(id: String, ad_id: String, result: CreativeTextAnalysis, version: &str) -> Self {
        Self {
            id,
            ad_id,
            creative_score: result.creative_score.clamp(0.0, 100.0),
            style_tags: result.style_tags,
            angle_tags: result.angle_tags,
            tone_tags: result.tone_tags,
            sentiment: result.sentiment,
            analyzer_version: version.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn tags_count(&self) -> usize {
        self.style_tags.len() + self.angle_tags.len() + self.tone_tags.len()
    }

    fn all_tags(&self) -> impl Iterator<Item = &String> {
        self.style_tags
            .iter()
            .chain(self.angle_tags.iter())
            .chain(self.tone_tags.iter())
    }
}

impl PartialEq for CreativeAnalysis {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CreativeAnalysis {}

/// Aggregated creative insights over one page's analyzed ads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCreativeInsights {
    pub page_id: String,
    pub avg_score: f64,
    pub best_score: f64,
    pub top_creatives: Vec<CreativeAnalysis>,
    pub sentiment_histogram: BTreeMap<String, u32>,
    pub common_tags: Vec<String>,
    pub total_analyzed: u32,
    pub computed_at: DateTime<Utc>,
}

impl PageCreativeInsights {
    pub fn empty(page_id: String) -> Self {
        Self {
            page_id,
            avg_score: 0.0,
            best_score: 0.0,
            top_creatives: Vec::new(),
            sentiment_histogram: BTreeMap::new(),
            common_tags: Vec::new(),
            total_analyzed: 0,
            computed_at: Utc::now(),
        }
    }

    /// Aggregate a page's analyses: average and best score, top-N by
    /// score, sentiment histogram, and tags shared by at least
    /// `min_count` of the top creatives.
    pub fn from_analyses(
        page_id: String,
        mut analyses: Vec<CreativeAnalysis>,
        top_n: usize,
        min_count: usize,
    ) -> Self {
        if analyses.is_empty() {
            return Self::empty(page_id);
        }

        let total = analyses.len();
        let sum: f64 = analyses.iter().map(|a| a.creative_score).sum();
        let best = analyses
            .iter()
            .map(|a| a.creative_score)
            .fold(0.0_f64, f64::max);

        let mut histogram: BTreeMap<String, u32> = BTreeMap::new();
        for a in &analyses {
            *histogram.entry(a.sentiment.as_str().to_string()).or_insert(0) += 1;
        }

        analyses.sort_by(|a, b| {
            b.creative_score
                .partial_cmp(&a.creative_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        analyses.truncate(top_n);

        let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for a in &analyses {
            for tag in a.all_tags() {
                *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let common_tags: Vec<String> = tag_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(tag, _)| tag.to_string())
            .collect();

        Self {
            page_id,
            avg_score: (sum / total as f64 * 100.0).round() / 100.0,
            best_score: best,
            top_creatives: analyses,
            sentiment_histogram: histogram,
            common_tags,
            total_analyzed: total as u32,
            computed_at: Utc::now(),
        }
    }
}
