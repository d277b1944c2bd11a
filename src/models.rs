//! Application configuration loaded from the environment.

use std::time::Duration;

/// Runtime configuration shared by the API server and the workers.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub ads_library_token: String,
    pub ads_library_base_url: String,
    pub ads_library_api_version: String,
    pub http_user_agent: String,
    pub http_timeout: Duration,
    pub worker_poll_interval: Duration,
    pub log_level: String,
    /// "simple" or "detailed"
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./shopscope.db".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let ads_library_token = std::env::var("ADS_LIBRARY_TOKEN").unwrap_or_default();

        let ads_library_base_url = std::env::var("ADS_LIBRARY_BASE_URL")
            .unwrap_or_else(|_| "https://graph.facebook.com".to_string());

        let ads_library_api_version =
            std::env::var("ADS_LIBRARY_API_VERSION").unwrap_or_else(|_| "v19.0".to_string());

        let http_user_agent = std::env::var("HTTP_USER_AGENT")
            .unwrap_or_else(|_| "ShopScope/1.0 (Shop Intelligence)".to_string());

        let http_timeout = std::env::var("HTTP_TIMEOUT_DEFAULT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let worker_poll_interval = std::env::var("WORKER_POLL_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(2));

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "simple".to_string());

        Ok(Self {
            database_path,
            port,
            ads_library_token,
            ads_library_base_url,
            ads_library_api_version,
            http_user_agent,
            http_timeout,
            worker_poll_interval,
            log_level,
            log_format,
        })
    }
}
