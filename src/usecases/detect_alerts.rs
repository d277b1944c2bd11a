//! Alert detection engine.
//!
//! Compares a page's fresh score/tier/ads-count against the prior
//! observation and emits one typed alert per firing rule. A persistence
//! failure for one alert does not abort the others.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::tiering::tier_order;
use crate::domain::{Alert, AlertSeverity, AlertType, DomainResult};
use crate::ports::AlertRepository;

pub const SCORE_CHANGE_THRESHOLD: f64 = 10.0;
pub const ADS_BOOST_RATIO_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Default)]
pub struct DetectAlertsInput {
    pub page_id: String,
    pub new_score: f64,
    pub new_tier: String,
    pub new_ads_count: u32,
    pub old_score: Option<f64>,
    pub old_tier: Option<String>,
    pub old_ads_count: Option<u32>,
}

pub struct DetectAlertsForPageUseCase {
    alerts: Arc<dyn AlertRepository>,
}

impl DetectAlertsForPageUseCase {
    pub fn new(alerts: Arc<dyn AlertRepository>) -> Self {
        Self { alerts }
    }

    pub async fn execute(&self, input: DetectAlertsInput) -> DomainResult<Vec<Alert>> {
        let detected = detect_alerts(&input);

        let mut persisted = Vec::with_capacity(detected.len());
        for alert in detected {
            match self.alerts.save(&alert).await {
                Ok(()) => persisted.push(alert),
                Err(err) => {
                    warn!(
                        page_id = %input.page_id,
                        alert_type = alert.alert_type.as_str(),
                        error = %err,
                        "Failed to persist alert, continuing with the rest"
                    );
                }
            }
        }

        if !persisted.is_empty() {
            info!(
                page_id = %input.page_id,
                alerts = persisted.len(),
                "Alerts detected"
            );
        }

        Ok(persisted)
    }
}

/// Pure rule evaluation; no priors means no alerts.
pub fn detect_alerts(input: &DetectAlertsInput) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = Vec::new();

    if let Some(old_score) = input.old_score {
        let delta = input.new_score - old_score;
        if delta >= SCORE_CHANGE_THRESHOLD {
            alerts.push(
                Alert::new(
                    Uuid::new_v4().to_string(),
                    input.page_id.clone(),
                    AlertType::ScoreJump,
                    AlertSeverity::Warning,
                    format!(
                        "Shop score jumped from {:.1} to {:.1} (+{:.1})",
                        old_score, input.new_score, delta
                    ),
                )
                .with_scores(old_score, input.new_score),
            );
        } else if -delta >= SCORE_CHANGE_THRESHOLD {
            alerts.push(
                Alert::new(
                    Uuid::new_v4().to_string(),
                    input.page_id.clone(),
                    AlertType::ScoreDrop,
                    AlertSeverity::Warning,
                    format!(
                        "Shop score dropped from {:.1} to {:.1} ({:.1})",
                        old_score, input.new_score, delta
                    ),
                )
                .with_scores(old_score, input.new_score),
            );
        }
    }

    if let Some(old_tier) = input.old_tier.as_deref() {
        if let (Some(old_order), Some(new_order)) =
            (tier_order(old_tier), tier_order(&input.new_tier))
        {
            if new_order > old_order {
                alerts.push(
                    Alert::new(
                        Uuid::new_v4().to_string(),
                        input.page_id.clone(),
                        AlertType::TierUp,
                        AlertSeverity::Info,
                        format!("Shop moved up from tier {} to {}", old_tier, input.new_tier),
                    )
                    .with_tiers(old_tier, &input.new_tier),
                );
            } else if new_order < old_order {
                alerts.push(
                    Alert::new(
                        Uuid::new_v4().to_string(),
                        input.page_id.clone(),
                        AlertType::TierDown,
                        AlertSeverity::Warning,
                        format!(
                            "Shop moved down from tier {} to {}",
                            old_tier, input.new_tier
                        ),
                    )
                    .with_tiers(old_tier, &input.new_tier),
                );
            }
        }
    }

    if let Some(old_ads) = input.old_ads_count {
        let ratio = input.new_ads_count as f64 / old_ads.max(1) as f64;
        if ratio - 1.0 >= ADS_BOOST_RATIO_THRESHOLD {
            alerts.push(Alert::new(
                Uuid::new_v4().to_string(),
                input.page_id.clone(),
                AlertType::NewAdsBoost,
                AlertSeverity::Warning,
                format!(
                    "Active ads went from {} to {} (x{:.1})",
                    old_ads, input.new_ads_count, ratio
                ),
            ));
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fakes::InMemoryAlerts;

    fn input(
        old_score: Option<f64>,
        new_score: f64,
        old_tier: Option<&str>,
        new_tier: &str,
        old_ads: Option<u32>,
        new_ads: u32,
    ) -> DetectAlertsInput {
        DetectAlertsInput {
            page_id: "p-1".into(),
            new_score,
            new_tier: new_tier.into(),
            new_ads_count: new_ads,
            old_score,
            old_tier: old_tier.map(str::to_string),
            old_ads_count: old_ads,
        }
    }

    #[test]
    fn no_priors_no_alerts() {
        let alerts = detect_alerts(&input(None, 75.0, None, "L", None, 10));
        assert!(alerts.is_empty());
    }

    #[test]
    fn below_threshold_changes_fire_nothing() {
        let alerts = detect_alerts(&input(Some(72.0), 75.0, Some("L"), "L", Some(10), 12));
        assert!(alerts.is_empty());
    }

    #[test]
    fn exact_threshold_jump_fires_one_score_jump() {
        let alerts = detect_alerts(&input(Some(50.0), 60.0, Some("M"), "M", Some(10), 10));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::ScoreJump);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].old_score, Some(50.0));
        assert_eq!(alerts[0].new_score, Some(60.0));
    }

    #[test]
    fn score_drop_fires_on_decline() {
        let alerts = detect_alerts(&input(Some(60.0), 45.0, Some("L"), "L", None, 0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::ScoreDrop);
    }

    #[test]
    fn tier_comparison_is_case_insensitive() {
        let up = detect_alerts(&input(None, 75.0, Some("m"), "XL", None, 0));
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].alert_type, AlertType::TierUp);
        assert_eq!(up[0].severity, AlertSeverity::Info);

        let down = detect_alerts(&input(None, 30.0, Some("XL"), "s", None, 0));
        assert_eq!(down[0].alert_type, AlertType::TierDown);
    }

    #[test]
    fn ads_boost_requires_doubling() {
        let boosted = detect_alerts(&input(None, 0.0, None, "XS", Some(10), 20));
        assert_eq!(boosted.len(), 1);
        assert_eq!(boosted[0].alert_type, AlertType::NewAdsBoost);

        let not_boosted = detect_alerts(&input(None, 0.0, None, "XS", Some(10), 19));
        assert!(not_boosted.is_empty());

        // zero prior count uses max(old, 1)
        let from_zero = detect_alerts(&input(None, 0.0, None, "XS", Some(0), 2));
        assert_eq!(from_zero.len(), 1);
    }

    #[test]
    fn combined_changes_fire_three_alerts() {
        let alerts = detect_alerts(&input(Some(60.0), 85.0, Some("M"), "XL", Some(10), 25));
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(alerts.len(), 3);
        assert!(types.contains(&AlertType::ScoreJump));
        assert!(types.contains(&AlertType::TierUp));
        assert!(types.contains(&AlertType::NewAdsBoost));
    }

    #[tokio::test]
    async fn persistence_failure_for_one_alert_keeps_the_rest() {
        let repo = Arc::new(InMemoryAlerts::default());
        repo.fail_types.lock().push(AlertType::ScoreJump);

        let persisted = DetectAlertsForPageUseCase::new(repo.clone())
            .execute(input(Some(60.0), 85.0, Some("M"), "XL", Some(10), 25))
            .await
            .unwrap();

        assert_eq!(persisted.len(), 2);
        assert_eq!(repo.alerts.lock().len(), 2);
        assert!(!persisted
            .iter()
            .any(|a| a.alert_type == AlertType::ScoreJump));
    }

    #[tokio::test]
    async fn all_alerts_are_persisted_on_success() {
        let repo = Arc::new(InMemoryAlerts::default());
        let persisted = DetectAlertsForPageUseCase::new(repo.clone())
            .execute(input(Some(60.0), 85.0, Some("M"), "XL", Some(10), 25))
            .await
            .unwrap();
        assert_eq!(persisted.len(), 3);
        assert_eq!(repo.alerts.lock().len(), 3);
    }
}
