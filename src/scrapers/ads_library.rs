//! Ads Library API client.
//!
//! Paginated GET client over the public ads archive endpoint. Follows
//! `paging.next` URLs, caps every request at 1000 results, batches
//! page-id lookups at 10 per request, and retries transient failures
//! with exponential backoff and jitter.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{Country, DomainError, DomainResult, Language};
use crate::ports::{AdsLibraryPort, RawAd};

const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 10_000;
const MAX_RESULTS_PER_REQUEST: u32 = 1_000;
const MAX_PAGE_IDS_PER_REQUEST: usize = 10;

/// Fields for basic ad search.
const BASIC_FIELDS: &str = "id,page_id,page_name,ad_creative_link_captions,\
ad_creative_link_titles,ad_creative_link_descriptions,ad_creative_bodies,\
ad_snapshot_url,publisher_platforms";

/// Fields for detailed ad retrieval.
const DETAIL_FIELDS: &str = "id,page_id,page_name,ad_creation_time,ad_creative_bodies,\
ad_creative_link_captions,ad_creative_link_titles,ad_creative_link_descriptions,\
ad_snapshot_url,ad_delivery_start_time,ad_delivery_stop_time,call_to_action_type,\
languages,countries,publisher_platforms,impressions,spend,currency";

#[derive(Debug, Clone)]
pub struct AdsLibraryConfig {
    pub base_url: String,
    pub api_version: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl AdsLibraryConfig {
    pub fn ads_archive_url(&self) -> String {
        format!("{}/{}/ads_archive", self.base_url, self.api_version)
    }
}

#[derive(Debug, Deserialize)]
struct AdsEnvelope {
    #[serde(default)]
    data: Vec<RawAd>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct AdsLibraryClient {
    client: Client,
    config: AdsLibraryConfig,
}

impl AdsLibraryClient {
    pub fn new(client: Client, config: AdsLibraryConfig) -> Self {
        Self { client, config }
    }

    async fn fetch_with_pagination(
        &self,
        params: Vec<(String, String)>,
        max_results: u32,
    ) -> DomainResult<Vec<RawAd>> {
        let mut all_ads: Vec<RawAd> = Vec::new();
        let mut next_url: Option<String> = None;

        while (all_ads.len() as u32) < max_results {
            let envelope = match &next_url {
                // paging.next already carries the access token
                Some(url) => self.execute_with_retry(url, &[]).await?,
                None => {
                    let mut with_token = params.clone();
                    with_token.push(("access_token".into(), self.config.access_token.clone()));
                    self.execute_with_retry(&self.config.ads_archive_url(), &with_token)
                        .await?
                }
            };

            if envelope.data.is_empty() {
                break;
            }
            all_ads.extend(envelope.data);

            next_url = envelope.paging.and_then(|p| p.next);
            if next_url.is_none() {
                break;
            }
        }

        all_ads.truncate(max_results as usize);
        Ok(all_ads)
    }

    async fn execute_with_retry(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> DomainResult<AdsEnvelope> {
        let mut backoff_ms = BACKOFF_BASE_MS;
        let mut last_rate_limit: Option<Option<u64>> = None;

        for attempt in 0..MAX_RETRIES {
            match self.execute_once(url, params).await {
                Ok(envelope) => return Ok(envelope),
                Err(RequestError::Fatal(err)) => return Err(err),
                Err(RequestError::RateLimited(retry_after_secs)) => {
                    last_rate_limit = Some(retry_after_secs);
                    if attempt + 1 < MAX_RETRIES {
                        let wait = retry_after_secs
                            .map(Duration::from_secs)
                            .unwrap_or_else(|| jittered(backoff_ms));
                        warn!(
                            attempt = attempt + 1,
                            wait_ms = wait.as_millis() as u64,
                            "Rate limited, backing off"
                        );
                        sleep(wait).await;
                        backoff_ms = (backoff_ms * 2).min(BACKOFF_CAP_MS);
                    }
                }
                Err(RequestError::Transient(reason)) => {
                    if attempt + 1 < MAX_RETRIES {
                        warn!(attempt = attempt + 1, reason = %reason, "Transient ads library error, retrying");
                        sleep(jittered(backoff_ms)).await;
                        backoff_ms = (backoff_ms * 2).min(BACKOFF_CAP_MS);
                    } else {
                        return Err(DomainError::AdsLibrary(reason));
                    }
                }
            }
        }

        // Repeated 429s within one call surface as a rate-limit error so
        // the enclosing KeywordRun can record RATE_LIMITED.
        match last_rate_limit {
            Some(retry_after_secs) => Err(DomainError::AdsLibraryRateLimit { retry_after_secs }),
            None => Err(DomainError::AdsLibrary("retries exhausted".into())),
        }
    }

    async fn execute_once(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<AdsEnvelope, RequestError> {
        let mut request = self.client.get(url).timeout(self.config.timeout);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Transient(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AdsEnvelope>()
                .await
                .map_err(|e| RequestError::Transient(format!("Invalid response body: {}", e)));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RequestError::Fatal(DomainError::AdsLibraryAuth));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(RequestError::RateLimited(retry_after_secs));
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.error)
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());

        if status.is_server_error() {
            return Err(RequestError::Transient(format!(
                "Server error {}: {}",
                status, message
            )));
        }

        // other 4xx fail fast
        Err(RequestError::Fatal(DomainError::AdsLibrary(format!(
            "Client error {}: {}",
            status, message
        ))))
    }
}

enum RequestError {
    Transient(String),
    RateLimited(Option<u64>),
    Fatal(DomainError),
}

fn jittered(base_ms: u64) -> Duration {
    // +/- 25% jitter
    let jitter = rand::thread_rng().gen_range(-0.25..=0.25);
    let ms = (base_ms as f64 * (1.0 + jitter)).max(0.0) as u64;
    Duration::from_millis(ms.min(BACKOFF_CAP_MS))
}

#[async_trait]
impl AdsLibraryPort for AdsLibraryClient {
    async fn search_ads_by_keyword(
        &self,
        keyword: &str,
        country: Country,
        language: Option<&Language>,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        info!(keyword = %keyword, country = %country, limit, "Searching ads by keyword");

        let mut params: Vec<(String, String)> = vec![
            ("ad_type".into(), "ALL".into()),
            ("ad_active_status".into(), "ACTIVE".into()),
            ("search_type".into(), "KEYWORD_UNORDERED".into()),
            ("ad_reached_countries".into(), country.code().to_string()),
            ("search_terms".into(), keyword.to_string()),
            (
                "limit".into(),
                limit.min(MAX_RESULTS_PER_REQUEST).to_string(),
            ),
            ("fields".into(), BASIC_FIELDS.into()),
        ];
        if let Some(language) = language {
            params.push(("languages".into(), language.code().to_string()));
        }

        let ads = self.fetch_with_pagination(params, limit).await?;
        info!(keyword = %keyword, ads_count = ads.len(), "Keyword search completed");
        Ok(ads)
    }

    async fn get_ads_by_page(
        &self,
        advertiser_page_ids: &[String],
        country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        if advertiser_page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let batch = &advertiser_page_ids[..advertiser_page_ids.len().min(MAX_PAGE_IDS_PER_REQUEST)];

        debug!(page_ids = batch.len(), country = %country, "Fetching ads by page ids");

        let params: Vec<(String, String)> = vec![
            ("ad_type".into(), "ALL".into()),
            ("ad_active_status".into(), "ACTIVE".into()),
            ("ad_reached_countries".into(), country.code().to_string()),
            ("search_page_ids".into(), batch.join(",")),
            (
                "limit".into(),
                limit.min(MAX_RESULTS_PER_REQUEST).to_string(),
            ),
            ("fields".into(), BASIC_FIELDS.into()),
        ];

        self.fetch_with_pagination(params, limit).await
    }

    async fn get_ads_details(
        &self,
        advertiser_page_id: &str,
        country: Country,
        limit: u32,
    ) -> DomainResult<Vec<RawAd>> {
        info!(advertiser_page_id = %advertiser_page_id, country = %country, "Fetching ad details");

        let params: Vec<(String, String)> = vec![
            ("ad_type".into(), "ALL".into()),
            ("ad_active_status".into(), "ACTIVE".into()),
            ("ad_reached_countries".into(), country.code().to_string()),
            ("search_page_ids".into(), advertiser_page_id.to_string()),
            (
                "limit".into(),
                limit.min(MAX_RESULTS_PER_REQUEST).to_string(),
            ),
            ("fields".into(), DETAIL_FIELDS.into()),
        ];

        let ads = self.fetch_with_pagination(params, limit).await?;
        info!(
            advertiser_page_id = %advertiser_page_id,
            ads_count = ads.len(),
            "Ad details fetch completed"
        );
        Ok(ads)
    }
}
