//! Ad entity - one creative observed in the ads library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Country;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdStatus {
    Active,
    Inactive,
    Unknown,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "ACTIVE",
            AdStatus::Inactive => "INACTIVE",
            AdStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "ACTIVE" => AdStatus::Active,
            "INACTIVE" => AdStatus::Inactive,
            _ => AdStatus::Unknown,
        }
    }
}

/// Publisher platform a creative runs on. Unknown strings map to
/// `Unknown` rather than failing the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPlatform {
    Facebook,
    Instagram,
    Messenger,
    AudienceNetwork,
    Threads,
    Unknown,
}

impl AdPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPlatform::Facebook => "facebook",
            AdPlatform::Instagram => "instagram",
            AdPlatform::Messenger => "messenger",
            AdPlatform::AudienceNetwork => "audience_network",
            AdPlatform::Threads => "threads",
            AdPlatform::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "facebook" => AdPlatform::Facebook,
            "instagram" => AdPlatform::Instagram,
            "messenger" => AdPlatform::Messenger,
            "audience_network" => AdPlatform::AudienceNetwork,
            "threads" => AdPlatform::Threads,
            _ => AdPlatform::Unknown,
        }
    }
}

/// One creative from the public ads library. Unique on `meta_ad_id`;
/// historical ads flip ACTIVE -> INACTIVE but are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub page_id: String,
    pub advertiser_page_id: String,
    pub meta_ad_id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub link_url: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub cta_type: Option<String>,
    pub status: AdStatus,
    pub platforms: Vec<AdPlatform>,
    pub countries: Vec<Country>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub impressions_lower: Option<i64>,
    pub impressions_upper: Option<i64>,
    pub spend_lower: Option<f64>,
    pub spend_upper: Option<f64>,
    pub currency: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Ad {
    pub fn new(id: String, page_id: String, advertiser_page_id: String, meta_ad_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            page_id,
            advertiser_page_id,
            meta_ad_id,
            title: None,
            body: None,
            link_url: None,
            image_url: None,
            video_url: None,
            cta_type: None,
            status: AdStatus::Active,
            platforms: Vec::new(),
            countries: Vec::new(),
            started_at: None,
            ended_at: None,
            impressions_lower: None,
            impressions_upper: None,
            spend_lower: None,
            spend_upper: None,
            currency: None,
            first_seen_at: now,
            last_seen_at: now,
        }
    }

    pub fn mark_as_active(&mut self) {
        self.status = AdStatus::Active;
        self.last_seen_at = Utc::now();
    }

    pub fn mark_as_inactive(&mut self) {
        self.status = AdStatus::Inactive;
        self.ended_at = Some(Utc::now());
        self.last_seen_at = Utc::now();
    }

    /// Title, body and CTA concatenated for creative analysis.
    pub fn creative_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(t) = self.title.as_deref() {
            parts.push(t);
        }
        if let Some(b) = self.body.as_deref() {
            parts.push(b);
        }
        if let Some(c) = self.cta_type.as_deref() {
            parts.push(c);
        }
        parts.join(" ")
    }
}

impl PartialEq for Ad {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ad {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_strings_do_not_fail() {
        assert_eq!(AdPlatform::parse("facebook"), AdPlatform::Facebook);
        assert_eq!(AdPlatform::parse("INSTAGRAM"), AdPlatform::Instagram);
        assert_eq!(AdPlatform::parse("tiktok"), AdPlatform::Unknown);
    }

    #[test]
    fn deactivation_stamps_end() {
        let mut ad = Ad::new("a".into(), "p".into(), "mp".into(), "m-1".into());
        assert_eq!(ad.status, AdStatus::Active);
        ad.mark_as_inactive();
        assert_eq!(ad.status, AdStatus::Inactive);
        assert!(ad.ended_at.is_some());
    }

    #[test]
    fn creative_text_skips_missing_fields() {
        let mut ad = Ad::new("a".into(), "p".into(), "mp".into(), "m-1".into());
        ad.title = Some("50% OFF".into());
        ad.cta_type = Some("shop_now".into());
        assert_eq!(ad.creative_text(), "50% OFF shop_now");
    }
}
