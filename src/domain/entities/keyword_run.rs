//! KeywordRun entity - one keyword-search invocation.
//!
//! Same lifecycle shape as Scan, with a RATE_LIMITED terminal that
//! stays retryable while attempts remain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scan::DEFAULT_MAX_RETRIES;
use crate::domain::value_objects::Country;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
    RateLimited,
}

impl KeywordRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordRunStatus::Pending => "pending",
            KeywordRunStatus::Running => "running",
            KeywordRunStatus::Completed => "completed",
            KeywordRunStatus::Failed => "failed",
            KeywordRunStatus::Cancelled => "cancelled",
            KeywordRunStatus::Timeout => "timeout",
            KeywordRunStatus::RateLimited => "rate_limited",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(KeywordRunStatus::Pending),
            "running" => Some(KeywordRunStatus::Running),
            "completed" => Some(KeywordRunStatus::Completed),
            "failed" => Some(KeywordRunStatus::Failed),
            "cancelled" => Some(KeywordRunStatus::Cancelled),
            "timeout" => Some(KeywordRunStatus::Timeout),
            "rate_limited" => Some(KeywordRunStatus::RateLimited),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRunResult {
    pub total_ads_found: u32,
    pub unique_pages_found: u32,
    pub new_pages_found: u32,
    pub ads_processed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRun {
    pub id: String,
    pub keyword: String,
    pub country: Country,
    pub page_limit: u32,
    pub status: KeywordRunStatus,
    pub result: Option<KeywordRunResult>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KeywordRun {
    pub fn new(id: String, keyword: String, country: Country, page_limit: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            keyword,
            country,
            page_limit,
            status: KeywordRunStatus::Pending,
            result: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) {
        self.status = KeywordRunStatus::Running;
        self.error_message = None;
        self.started_at = Some(Utc::now());
        self.touch();
    }

    pub fn complete(&mut self, result: KeywordRunResult) {
        self.status = KeywordRunStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn fail(&mut self, error_message: impl Into<String>) {
        self.status = KeywordRunStatus::Failed;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn rate_limited(&mut self, retry_after_secs: Option<u64>) {
        self.status = KeywordRunStatus::RateLimited;
        self.error_message = Some(match retry_after_secs {
            Some(secs) => format!("Rate limited by ads library, retry after {}s", secs),
            None => "Rate limited by ads library".to_string(),
        });
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn retry(&self) -> Self {
        Self {
            id: self.id.clone(),
            keyword: self.keyword.clone(),
            country: self.country,
            page_limit: self.page_limit,
            status: KeywordRunStatus::Pending,
            result: None,
            retry_count: self.retry_count + 1,
            max_retries: self.max_retries,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(
            self.status,
            KeywordRunStatus::Failed | KeywordRunStatus::Timeout | KeywordRunStatus::RateLimited
        ) && self.retry_count < self.max_retries
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            KeywordRunStatus::Completed
                | KeywordRunStatus::Cancelled
                | KeywordRunStatus::Failed
                | KeywordRunStatus::Timeout
                | KeywordRunStatus::RateLimited
        ) && !self.can_retry()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for KeywordRun {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KeywordRun {}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> KeywordRun {
        KeywordRun::new(
            "kr-1".into(),
            "led lamp".into(),
            Country::parse("US").unwrap(),
            1000,
        )
    }

    #[test]
    fn completed_run_is_terminal() {
        let mut r = run();
        r.start();
        r.complete(KeywordRunResult {
            total_ads_found: 40,
            unique_pages_found: 6,
            new_pages_found: 2,
            ads_processed: 38,
        });
        assert!(r.is_terminal());
        assert!(!r.can_retry());
    }

    #[test]
    fn rate_limited_run_stays_retryable() {
        let mut r = run();
        r.start();
        r.rate_limited(Some(30));
        assert_eq!(r.status, KeywordRunStatus::RateLimited);
        assert!(r.can_retry());
        assert!(!r.is_terminal());

        let again = r.retry();
        assert_eq!(again.status, KeywordRunStatus::Pending);
        assert_eq!(again.retry_count, 1);
    }
}
