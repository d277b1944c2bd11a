//! ShopScore entity - one immutable score observation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tiering;

/// Append-only score row. The score is clamped to [0, 100] at
/// construction no matter what the caller passes; the tier is always
/// derived, never stored as source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopScore {
    pub id: String,
    pub page_id: String,
    pub score: f64,
    pub components: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl ShopScore {
    pub fn new(id: String, page_id: String, score: f64, components: BTreeMap<String, f64>) -> Self {
        Self {
            id,
            page_id,
            score: score.clamp(0.0, 100.0),
            components,
            created_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> &'static str {
        tiering::score_to_tier(self.score)
    }
}

impl PartialEq for ShopScore {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShopScore {}

/// Ranked-shop projection produced by the read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedShop {
    pub page_id: String,
    pub score: f64,
    pub tier: String,
    pub url: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
}

/// Paginated ranked result with the total for the same filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedShopsResult {
    pub items: Vec<RankedShop>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl RankedShopsResult {
    pub fn has_more(&self) -> bool {
        (self.offset as u64) + (self.items.len() as u64) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_clamped_at_construction() {
        let s = ShopScore::new("s".into(), "p".into(), 240.0, BTreeMap::new());
        assert_eq!(s.score, 100.0);
        let s = ShopScore::new("s".into(), "p".into(), -3.0, BTreeMap::new());
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn tier_is_derived_from_score() {
        let s = ShopScore::new("s".into(), "p".into(), 72.5, BTreeMap::new());
        assert_eq!(s.tier(), "XL");
    }

    #[test]
    fn has_more_tracks_offset_and_total() {
        let item = RankedShop {
            page_id: "p".into(),
            score: 50.0,
            tier: "M".into(),
            url: None,
            country: None,
            name: None,
        };
        let result = RankedShopsResult {
            items: vec![item.clone(), item],
            total: 5,
            limit: 2,
            offset: 0,
        };
        assert!(result.has_more());

        let last_page = RankedShopsResult {
            items: vec![],
            total: 5,
            limit: 2,
            offset: 5,
        };
        assert!(!last_page.has_more());
    }
}
