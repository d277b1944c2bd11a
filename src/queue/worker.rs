//! Worker runtime.
//!
//! Polls the durable queue, executes one task at a time, and applies
//! the retry policy: exponential backoff from 1 s, factor 2, jitter
//! +/- 25 %, capped at 10 s, at most 3 attempts, retryable errors
//! only. Every handler is idempotent so at-least-once delivery is
//! safe.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{interval, timeout};
use tracing::{error, info, warn};

use crate::domain::tiering;
use crate::domain::{DomainError, DomainResult};
use crate::ports::TaskRequest;
use crate::services::Services;
use crate::usecases::DetectAlertsInput;

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 10_000;

/// Hard per-task deadline; an overrun counts as a retryable timeout.
const TASK_DEADLINE: Duration = Duration::from_secs(120);

pub struct Worker {
    services: Arc<Services>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(services: Arc<Services>, poll_interval: Duration) -> Self {
        Self {
            services,
            poll_interval,
        }
    }

    /// Poll loop. Drains the queue, then sleeps one interval.
    pub async fn run(&self) {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "👷 Worker started");
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            loop {
                match self.process_next().await {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(err) => {
                        error!(error = %err, "Worker queue error");
                        break;
                    }
                }
            }
        }
    }

    /// Claim and execute one task. Returns false when the queue is
    /// empty.
    pub async fn process_next(&self) -> DomainResult<bool> {
        let Some(task) = self.services.queue.claim_next()? else {
            return Ok(false);
        };

        let name = task.request.name();
        info!(task = name, task_id = task.id, attempt = task.attempts, "Executing task");

        let outcome = match timeout(TASK_DEADLINE, self.execute(&task.request)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::Scraping {
                url: name.to_string(),
                reason: "task deadline exceeded".into(),
            }),
        };

        match outcome {
            Ok(()) => {
                self.services.queue.complete(task.id)?;
                info!(task = name, task_id = task.id, "Task completed");
            }
            Err(err) if err.is_retryable() => {
                let delay = backoff_delay(task.attempts);
                let requeued = self
                    .services
                    .queue
                    .fail(&task, &err.to_string(), delay)?;
                warn!(
                    task = name,
                    task_id = task.id,
                    error = %err,
                    requeued,
                    "Task failed with retryable error"
                );
            }
            Err(err) => {
                self.services
                    .queue
                    .fail_permanently(task.id, &err.to_string())?;
                error!(task = name, task_id = task.id, error = %err, "Task failed permanently");
            }
        }

        Ok(true)
    }

    async fn execute(&self, request: &TaskRequest) -> DomainResult<()> {
        match request {
            TaskRequest::ScanPage {
                page_id,
                scan_id,
                country,
            } => {
                // cancellation checkpoint: a scan cancelled while queued
                // is dropped here
                if let Some(scan) = self.services.scans.get(*scan_id).await? {
                    if scan.status == crate::domain::ScanStatus::Cancelled {
                        info!(scan_id = %scan_id, "Scan cancelled, skipping");
                        return Ok(());
                    }
                }
                self.services
                    .deep_analysis
                    .execute(page_id, *country, *scan_id)
                    .await?;
            }
            TaskRequest::AnalyseWebsite { page_id, url } => {
                self.services.website_analysis.execute(page_id, url).await?;
            }
            TaskRequest::CountSitemapProducts {
                page_id,
                website,
                country,
            } => {
                self.services
                    .catalog_sizing
                    .execute(page_id, website, *country)
                    .await?;
                // catalog sizing completes the fingerprint; the score
                // follows
                self.services
                    .dispatcher
                    .dispatch(TaskRequest::ComputeShopScore {
                        page_id: page_id.clone(),
                    })
                    .await?;
            }
            TaskRequest::ComputeShopScore { page_id } => {
                self.compute_score_and_alerts(page_id).await?;
            }
            TaskRequest::AnalyzeCreativesForPage { page_id } => {
                self.services.creative_insights.execute(page_id, 5).await?;
            }
            TaskRequest::SnapshotDailyMetrics => {
                self.services.daily_snapshot.execute(None).await?;
            }
        }
        Ok(())
    }

    /// Score the page, then compare against the prior observation and
    /// emit alerts.
    async fn compute_score_and_alerts(&self, page_id: &str) -> DomainResult<()> {
        let prior_score = self.services.scoring.get_latest_by_page_id(page_id).await?;
        let prior_metrics = self
            .services
            .metrics
            .list_page_metrics(page_id, None, None, 90)
            .await?;
        let old_ads_count = prior_metrics.last().map(|m| m.ads_count);

        let result = self.services.shop_score.execute(page_id).await?;

        let page = self
            .services
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        self.services
            .detect_alerts
            .execute(DetectAlertsInput {
                page_id: page_id.to_string(),
                new_score: result.global_score,
                new_tier: result.tier.to_string(),
                new_ads_count: page.active_ads_count,
                old_score: prior_score.as_ref().map(|s| s.score),
                old_tier: prior_score
                    .as_ref()
                    .map(|s| tiering::score_to_tier(s.score).to_string()),
                old_ads_count,
            })
            .await?;

        Ok(())
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(BACKOFF_CAP_MS);
    let jitter = rand::thread_rng().gen_range(-0.25..=0.25);
    Duration::from_millis(((capped as f64) * (1.0 + jitter)).max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        for _ in 0..50 {
            let first = backoff_delay(1);
            assert!(first.as_millis() >= 750 && first.as_millis() <= 1_250);
            let third = backoff_delay(3);
            assert!(third.as_millis() >= 3_000 && third.as_millis() <= 5_000);
            let huge = backoff_delay(30);
            assert!(huge.as_millis() <= 12_500);
        }
    }
}
