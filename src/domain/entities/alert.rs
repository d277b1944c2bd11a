//! Alert entity - immutable change-detection event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    ScoreJump,
    ScoreDrop,
    TierUp,
    TierDown,
    NewAdsBoost,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ScoreJump => "SCORE_JUMP",
            AlertType::ScoreDrop => "SCORE_DROP",
            AlertType::TierUp => "TIER_UP",
            AlertType::TierDown => "TIER_DOWN",
            AlertType::NewAdsBoost => "NEW_ADS_BOOST",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCORE_JUMP" => Some(AlertType::ScoreJump),
            "SCORE_DROP" => Some(AlertType::ScoreDrop),
            "TIER_UP" => Some(AlertType::TierUp),
            "TIER_DOWN" => Some(AlertType::TierDown),
            "NEW_ADS_BOOST" => Some(AlertType::NewAdsBoost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "info" => AlertSeverity::Info,
            "critical" => AlertSeverity::Critical,
            _ => AlertSeverity::Warning,
        }
    }
}

/// Append-only alert row emitted by the change-detection engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub page_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub old_score: Option<f64>,
    pub new_score: Option<f64>,
    pub old_tier: Option<String>,
    pub new_tier: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        id: String,
        page_id: String,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
    ) -> Self {
        Self {
            id,
            page_id,
            alert_type,
            severity,
            message,
            old_score: None,
            new_score: None,
            old_tier: None,
            new_tier: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_scores(mut self, old: f64, new: f64) -> Self {
        self.old_score = Some(old);
        self.new_score = Some(new);
        self
    }

    pub fn with_tiers(mut self, old: &str, new: &str) -> Self {
        self.old_tier = Some(old.to_string());
        self.new_tier = Some(new.to_string());
        self
    }
}

impl PartialEq for Alert {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Alert {}
