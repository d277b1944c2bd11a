//! Page entity - one tracked storefront.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::page_state::PageStatus;
use crate::domain::value_objects::{Category, Country, Currency, Language, ProductCount, Url};

/// A tracked storefront discovered through the ads library.
///
/// Identity is the `id`; `domain` is always derived from `url` so the
/// two can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: Url,
    pub domain: String,
    pub state: PageStatus,
    pub country: Country,
    pub language: Option<Language>,
    pub currency: Option<Currency>,
    pub category: Option<Category>,
    pub product_count: ProductCount,
    pub is_commerce_platform: bool,
    pub commerce_profile_id: Option<String>,
    /// Page identifier on the ads-library side, distinct from `id`.
    pub advertiser_page_id: String,
    pub active_ads_count: u32,
    pub total_ads_count: u32,
    pub score: Option<f64>,
    pub first_seen_at: DateTime<Utc>,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(
        id: String,
        url: Url,
        country: Country,
        advertiser_page_id: String,
        active_ads_count: u32,
    ) -> Self {
        let now = Utc::now();
        let domain = url.domain();
        Self {
            id,
            url,
            domain,
            state: PageStatus::Discovered,
            country,
            language: None,
            currency: None,
            category: None,
            product_count: ProductCount::zero(),
            is_commerce_platform: false,
            commerce_profile_id: None,
            advertiser_page_id,
            active_ads_count,
            total_ads_count: active_ads_count,
            score: None,
            first_seen_at: now,
            last_scanned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the canonical URL, keeping `domain` in sync.
    pub fn set_url(&mut self, url: Url) {
        self.domain = url.domain();
        self.url = url;
        self.touch();
    }

    pub fn transition_to(&mut self, target: PageStatus) -> DomainResult<()> {
        self.state = self.state.transition_to(target)?;
        self.touch();
        Ok(())
    }

    /// Walk the page into `Analyzing`, stepping through the intermediate
    /// states the transition table requires. Error states recover via
    /// `Pending` first.
    pub fn begin_analysis(&mut self) -> DomainResult<()> {
        if self.state.is_error() || self.state == PageStatus::Discovered {
            self.transition_to(PageStatus::Pending)?;
        }
        if self.state == PageStatus::Pending {
            self.transition_to(PageStatus::Analyzing)?;
        }
        Ok(())
    }

    /// Record a positive commerce-platform verdict. Re-verifying a page
    /// that already sits in the verified family only refreshes the
    /// profile reference.
    pub fn mark_as_commerce(&mut self, profile_id: String) -> DomainResult<()> {
        match self.state {
            PageStatus::VerifiedCommerce | PageStatus::Active | PageStatus::Inactive => {}
            PageStatus::Analyzing => {
                self.transition_to(PageStatus::Analyzed)?;
                self.transition_to(PageStatus::VerifiedCommerce)?;
            }
            _ => self.transition_to(PageStatus::VerifiedCommerce)?,
        }
        self.is_commerce_platform = true;
        self.commerce_profile_id = Some(profile_id);
        self.touch();
        Ok(())
    }

    /// Record a negative commerce-platform verdict.
    pub fn mark_as_not_commerce(&mut self) -> DomainResult<()> {
        match self.state {
            PageStatus::NotCommerce => {}
            PageStatus::Analyzing => {
                self.transition_to(PageStatus::Analyzed)?;
                self.transition_to(PageStatus::NotCommerce)?;
            }
            _ => self.transition_to(PageStatus::NotCommerce)?,
        }
        self.is_commerce_platform = false;
        self.commerce_profile_id = None;
        self.touch();
        Ok(())
    }

    /// Catalog sizing promotes verified shops with products to `Active`.
    pub fn set_product_count(&mut self, count: ProductCount) -> DomainResult<()> {
        self.product_count = count;
        if self.state == PageStatus::VerifiedCommerce && !count.is_empty() {
            self.transition_to(PageStatus::Active)?;
        }
        self.touch();
        Ok(())
    }

    /// Ad counting promotes verified shops with running ads to `Active`.
    pub fn update_ads_count(&mut self, active: u32, total: u32) -> DomainResult<()> {
        self.active_ads_count = active;
        self.total_ads_count = total;
        if self.state == PageStatus::VerifiedCommerce && active > 0 {
            self.transition_to(PageStatus::Active)?;
        }
        self.touch();
        Ok(())
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = Some(currency);
        self.touch();
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = Some(category);
        self.touch();
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = Some(score.clamp(0.0, 100.0));
        self.touch();
    }

    pub fn record_scan(&mut self) {
        self.last_scanned_at = Some(Utc::now());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Page {}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(
            "p-1".into(),
            Url::parse("https://www.glowshop.com").unwrap(),
            Country::parse("FR").unwrap(),
            "123456".into(),
            3,
        )
    }

    #[test]
    fn domain_always_matches_url() {
        let mut p = page();
        assert_eq!(p.domain, "glowshop.com");
        p.set_url(Url::parse("https://other-store.io/landing").unwrap());
        assert_eq!(p.domain, "other-store.io");
    }

    #[test]
    fn commerce_verdict_path() {
        let mut p = page();
        p.begin_analysis().unwrap();
        assert_eq!(p.state, PageStatus::Analyzing);
        p.mark_as_commerce("profile-1".into()).unwrap();
        assert!(p.is_commerce_platform);
        assert_eq!(p.state, PageStatus::VerifiedCommerce);
    }

    #[test]
    fn products_promote_verified_shop_to_active() {
        let mut p = page();
        p.begin_analysis().unwrap();
        p.mark_as_commerce("profile-1".into()).unwrap();
        p.set_product_count(ProductCount::new(12).unwrap()).unwrap();
        assert_eq!(p.state, PageStatus::Active);
    }

    #[test]
    fn zero_products_leave_state_untouched() {
        let mut p = page();
        p.begin_analysis().unwrap();
        p.mark_as_commerce("profile-1".into()).unwrap();
        p.set_product_count(ProductCount::zero()).unwrap();
        assert_eq!(p.state, PageStatus::VerifiedCommerce);
    }

    #[test]
    fn not_commerce_cannot_go_active() {
        let mut p = page();
        p.begin_analysis().unwrap();
        p.mark_as_not_commerce().unwrap();
        assert!(p.transition_to(PageStatus::Active).is_err());
    }
}
