//! Storefront HTML scraper.
//!
//! Two small fetches per site: full HTML (15 s budget) and a
//! headers-only request (10 s budget). A 403 or a captcha wall is a
//! blocked verdict, not a transient error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::domain::{DomainError, DomainResult, Url};
use crate::ports::HtmlScraperPort;

const HTML_TIMEOUT: Duration = Duration::from_secs(15);
const HEADERS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HtmlScraper {
    client: Client,
}

impl HtmlScraper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn classify_status(url: &Url, status: StatusCode) -> Option<DomainError> {
        if status.is_success() {
            return None;
        }
        if status == StatusCode::FORBIDDEN {
            return Some(DomainError::ScrapingBlocked(url.to_string()));
        }
        Some(DomainError::Scraping {
            url: url.to_string(),
            reason: format!("status {}", status),
        })
    }
}

#[async_trait]
impl HtmlScraperPort for HtmlScraper {
    async fn fetch_html(&self, url: &Url) -> DomainResult<String> {
        debug!(url = %url, "Fetching HTML");

        let response = self
            .client
            .get(url.as_str())
            .timeout(HTML_TIMEOUT)
            .send()
            .await
            .map_err(|e| DomainError::Scraping {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(err) = Self::classify_status(url, response.status()) {
            return Err(err);
        }

        let body = response.text().await.map_err(|e| DomainError::Scraping {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
        })?;

        // Some blockers answer 200 with an interstitial challenge page.
        let head = &body[..body.len().min(2_048)];
        if head.to_lowercase().contains("captcha") {
            return Err(DomainError::ScrapingBlocked(url.to_string()));
        }

        Ok(body)
    }

    async fn fetch_headers(&self, url: &Url) -> DomainResult<HashMap<String, String>> {
        debug!(url = %url, "Fetching headers");

        let response = self
            .client
            .head(url.as_str())
            .timeout(HEADERS_TIMEOUT)
            .send()
            .await
            .map_err(|e| DomainError::Scraping {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(err) = Self::classify_status(url, response.status()) {
            return Err(err);
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_blocked_not_transient() {
        let url = Url::parse("https://shop.example.com").unwrap();
        let err = HtmlScraper::classify_status(&url, StatusCode::FORBIDDEN).unwrap();
        assert!(matches!(err, DomainError::ScrapingBlocked(_)));

        let err = HtmlScraper::classify_status(&url, StatusCode::NOT_FOUND).unwrap();
        assert!(matches!(err, DomainError::Scraping { .. }));

        assert!(HtmlScraper::classify_status(&url, StatusCode::OK).is_none());
    }
}
