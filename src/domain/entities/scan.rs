//! Scan entity - one unit of analysis work with a retryable lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ScanId;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Full,
    AdsOnly,
    PlatformDetect,
    Sitemap,
    ProfileUpdate,
    Quick,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Full => "full",
            ScanType::AdsOnly => "ads_only",
            ScanType::PlatformDetect => "platform_detect",
            ScanType::Sitemap => "sitemap",
            ScanType::ProfileUpdate => "profile_update",
            ScanType::Quick => "quick",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full" => Some(ScanType::Full),
            "ads_only" => Some(ScanType::AdsOnly),
            "platform_detect" => Some(ScanType::PlatformDetect),
            "sitemap" => Some(ScanType::Sitemap),
            "profile_update" => Some(ScanType::ProfileUpdate),
            "quick" => Some(ScanType::Quick),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Timeout => "timeout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ScanStatus::Pending),
            "running" => Some(ScanStatus::Running),
            "completed" => Some(ScanStatus::Completed),
            "failed" => Some(ScanStatus::Failed),
            "cancelled" => Some(ScanStatus::Cancelled),
            "timeout" => Some(ScanStatus::Timeout),
            _ => None,
        }
    }
}

/// Outcome payload recorded when a scan completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub ads_found: u32,
    #[serde(default)]
    pub new_ads: u32,
    #[serde(default)]
    pub products_found: u32,
    #[serde(default)]
    pub is_commerce: Option<bool>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: ScanId,
    pub page_id: String,
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub result: Option<ScanResult>,
    pub priority: i32,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scan {
    pub fn new(page_id: String, scan_type: ScanType) -> Self {
        Self::with_id(ScanId::generate(), page_id, scan_type)
    }

    /// Create a scan under a caller-provided id (queue-chained scans
    /// carry their id through the task args).
    pub fn with_id(id: ScanId, page_id: String, scan_type: ScanType) -> Self {
        let now = Utc::now();
        Self {
            id,
            page_id,
            scan_type,
            status: ScanStatus::Pending,
            result: None,
            priority: 0,
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
        self.status = ScanStatus::Running;
        self.error_message = None;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.touch();
    }

    pub fn complete(&mut self, result: ScanResult) {
        self.status = ScanStatus::Completed;
        self.result = Some(result);
        self.error_message = None;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn fail(&mut self, error_message: impl Into<String>) {
        self.status = ScanStatus::Failed;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn cancel(&mut self) {
        self.status = ScanStatus::Cancelled;
        self.error_message = None;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn timeout(&mut self) {
        self.status = ScanStatus::Timeout;
        self.error_message = Some("Scan timed out".to_string());
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    /// Fresh PENDING attempt with the retry counter bumped.
    pub fn retry(&self) -> Self {
        let now = Utc::now();
        Self {
            id: self.id,
            page_id: self.page_id.clone(),
            scan_type: self.scan_type,
            status: ScanStatus::Pending,
            result: None,
            priority: self.priority,
            retry_count: self.retry_count + 1,
            max_retries: self.max_retries,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.status, ScanStatus::Failed | ScanStatus::Timeout)
            && self.retry_count < self.max_retries
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ScanStatus::Completed | ScanStatus::Cancelled | ScanStatus::Failed | ScanStatus::Timeout
        ) && !self.can_retry()
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some((end - started).num_milliseconds() as f64 / 1000.0)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Scan {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Scan {}
