//! Scoring engine.
//!
//! Fuses four weighted sub-scores into the 0-100 shop score and
//! persists one append-only ShopScore row with its components.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Ad, DomainError, DomainResult, Page, ShopScore};
use crate::ports::{AdsRepository, PageRepository, ScoringRepository};

pub const WEIGHT_ADS_ACTIVITY: f64 = 0.4;
pub const WEIGHT_COMMERCE: f64 = 0.3;
pub const WEIGHT_CREATIVE_QUALITY: f64 = 0.2;
pub const WEIGHT_CATALOG: f64 = 0.1;

/// CTA phrases counted toward creative quality.
const CTA_PHRASES: &[&str] = &[
    "buy now",
    "shop now",
    "order now",
    "shop",
    "get yours",
    "grab yours",
];

lazy_static! {
    static ref EMOJI_PATTERN: Regex = Regex::new(
        "[\u{1F300}-\u{1F9FF}\u{1FA00}-\u{1FA6F}\u{1FA70}-\u{1FAFF}\u{2702}-\u{27B0}\u{1F600}-\u{1F64F}]"
    )
    .unwrap();
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ads activity: volume (ref 50), country diversity (ref 5), platform
/// diversity (ref 3), weighted 0.6/0.2/0.2. Zero without ads.
pub fn calc_ads_activity_score(ads: &[Ad]) -> f64 {
    if ads.is_empty() {
        return 0.0;
    }

    let mut countries: BTreeSet<&str> = BTreeSet::new();
    let mut platforms: BTreeSet<&str> = BTreeSet::new();
    for ad in ads {
        for country in &ad.countries {
            countries.insert(country.code());
        }
        for platform in &ad.platforms {
            platforms.insert(platform.as_str());
        }
    }

    let normalized_count = (ads.len() as f64 / 50.0).min(1.0);
    let country_diversity = (countries.len() as f64 / 5.0).min(1.0);
    let platform_diversity = (platforms.len() as f64 / 3.0).min(1.0);

    clamp((0.6 * normalized_count + 0.2 * country_diversity + 0.2 * platform_diversity) * 100.0)
}

/// Commerce signals: base 20, verified platform +30, strong currency
/// +20, active ads +20, established advertiser (>= 10 total) +10.
pub fn calc_commerce_score(page: &Page) -> f64 {
    let mut score = 20.0;
    if page.is_commerce_platform {
        score += 30.0;
    }
    if page.currency.as_ref().is_some_and(|c| c.is_strong()) {
        score += 20.0;
    }
    if page.active_ads_count > 0 {
        score += 20.0;
    }
    if page.total_ads_count >= 10 {
        score += 10.0;
    }
    clamp(score)
}

/// Creative quality over the page's ads: any text +20, discount markers
/// +20, emoji +15, CTA phrase +25, cta_type set +20. Zero without ads.
pub fn calc_creative_quality_score(ads: &[Ad]) -> f64 {
    if ads.is_empty() {
        return 0.0;
    }

    let mut has_text = false;
    let mut has_discount = false;
    let mut has_emoji = false;
    let mut has_cta_phrase = false;
    let mut has_cta_type = false;

    for ad in ads {
        let mut text = String::new();
        if let Some(title) = &ad.title {
            text.push_str(&title.to_lowercase());
            text.push(' ');
        }
        if let Some(body) = &ad.body {
            text.push_str(&body.to_lowercase());
        }

        if !text.trim().is_empty() {
            has_text = true;
            if text.contains('%') || text.contains("off") || text.contains("sale") {
                has_discount = true;
            }
            if EMOJI_PATTERN.is_match(&text) {
                has_emoji = true;
            }
            if CTA_PHRASES.iter().any(|cta| text.contains(cta)) {
                has_cta_phrase = true;
            }
        }

        if ad.cta_type.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            has_cta_type = true;
        }
    }

    let mut score = 0.0;
    if has_text {
        score += 20.0;
    }
    if has_discount {
        score += 20.0;
    }
    if has_emoji {
        score += 15.0;
    }
    if has_cta_phrase {
        score += 25.0;
    }
    if has_cta_type {
        score += 20.0;
    }
    clamp(score)
}

/// Catalog size normalized to 200 products. Zero without products.
pub fn calc_catalog_score(page: &Page) -> f64 {
    let count = page.product_count.value();
    if count == 0 {
        return 0.0;
    }
    clamp((count as f64 / 200.0).min(1.0) * 100.0)
}

#[derive(Debug, Clone)]
pub struct ComputeShopScoreResult {
    pub page_id: String,
    pub global_score: f64,
    pub components: BTreeMap<String, f64>,
    pub tier: &'static str,
}

pub struct ComputeShopScoreUseCase {
    pages: Arc<dyn PageRepository>,
    ads: Arc<dyn AdsRepository>,
    scoring: Arc<dyn ScoringRepository>,
}

impl ComputeShopScoreUseCase {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        ads: Arc<dyn AdsRepository>,
        scoring: Arc<dyn ScoringRepository>,
    ) -> Self {
        Self {
            pages,
            ads,
            scoring,
        }
    }

    pub async fn execute(&self, page_id: &str) -> DomainResult<ComputeShopScoreResult> {
        let mut page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        let ads = self.ads.list_by_page(page_id).await?;

        let ads_activity = calc_ads_activity_score(&ads);
        let commerce = calc_commerce_score(&page);
        let creative_quality = calc_creative_quality_score(&ads);
        let catalog = calc_catalog_score(&page);

        let global_score = round2(clamp(
            WEIGHT_ADS_ACTIVITY * ads_activity
                + WEIGHT_COMMERCE * commerce
                + WEIGHT_CREATIVE_QUALITY * creative_quality
                + WEIGHT_CATALOG * catalog,
        ));

        let mut components = BTreeMap::new();
        components.insert("ads_activity".to_string(), round2(ads_activity));
        components.insert("commerce".to_string(), round2(commerce));
        components.insert("creative_quality".to_string(), round2(creative_quality));
        components.insert("catalog".to_string(), round2(catalog));

        let shop_score = ShopScore::new(
            Uuid::new_v4().to_string(),
            page_id.to_string(),
            global_score,
            components.clone(),
        );
        let tier = shop_score.tier();
        self.scoring.save(&shop_score).await?;

        page.set_score(global_score);
        self.pages.save(&page).await?;

        info!(
            page_id = %page_id,
            global_score,
            tier,
            ads_activity = components["ads_activity"],
            commerce = components["commerce"],
            creative_quality = components["creative_quality"],
            catalog = components["catalog"],
            "Shop score computed"
        );

        Ok(ComputeShopScoreResult {
            page_id: page_id.to_string(),
            global_score,
            components,
            tier,
        })
    }
}
