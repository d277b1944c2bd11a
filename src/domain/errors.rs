//! Domain errors for the shop intelligence pipeline.
//!
//! Every business-rule violation and infrastructure failure surfaced to
//! use cases is one of these variants. Adapters wrap their native errors
//! into the matching variant with context before propagation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid ISO 3166-1 alpha-2 country code: {0}")]
    InvalidCountry(String),

    #[error("Invalid ISO 639-1 language code: {0}")]
    InvalidLanguage(String),

    #[error("Invalid ISO 4217 currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid product count: {0}")]
    InvalidProductCount(i64),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid scan ID format (expected UUID): {0}")]
    InvalidScanId(String),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Invalid page state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid ranking criteria: {0}")]
    InvalidRankingCriteria(String),

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    #[error("{entity} not found: {id}")]
    EntityNotFound { entity: &'static str, id: String },

    #[error("Page is blacklisted: {0}")]
    Blacklisted(String),

    #[error("Ads library error: {0}")]
    AdsLibrary(String),

    #[error("Ads library authentication failed")]
    AdsLibraryAuth,

    #[error("Ads library rate limit exceeded (retry after {retry_after_secs:?}s)")]
    AdsLibraryRateLimit { retry_after_secs: Option<u64> },

    #[error("Scraping failed for {url}: {reason}")]
    Scraping { url: String, reason: String },

    #[error("Scraping blocked by target site: {0}")]
    ScrapingBlocked(String),

    #[error("No sitemap found for {0}")]
    SitemapNotFound(String),

    #[error("Failed to parse sitemap {url}: {reason}")]
    SitemapParse { url: String, reason: String },

    #[error("Repository error during {operation}: {reason}")]
    Repository { operation: &'static str, reason: String },

    #[error("Failed to dispatch task {task}: {reason}")]
    TaskDispatch { task: String, reason: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn repository(operation: &'static str, reason: impl ToString) -> Self {
        Self::Repository {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Transient upstream failures that the worker retry policy covers.
    /// Target-site 4xx responses are permanent and excluded.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AdsLibrary(_) | Self::AdsLibraryRateLimit { .. } | Self::TaskDispatch { .. } => {
                true
            }
            Self::Scraping { reason, .. } => !reason.contains("status 4"),
            _ => false,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
