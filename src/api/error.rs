//! HTTP mapping for domain errors.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::DomainError;

pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use DomainError::*;

        let (status, retry_after) = match &self.0 {
            InvalidUrl(_) | InvalidCountry(_) | InvalidLanguage(_) | InvalidCurrency(_)
            | InvalidProductCount(_) | InvalidCategory(_) | InvalidScanId(_)
            | InvalidPaymentMethod(_) | InvalidKeyword(_) | InvalidTier(_)
            | InvalidRankingCriteria(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
            InvalidStateTransition(_) => (StatusCode::BAD_REQUEST, None),
            EntityNotFound { .. } => (StatusCode::NOT_FOUND, None),
            Blacklisted(_) | ScrapingBlocked(_) => (StatusCode::FORBIDDEN, None),
            AdsLibraryAuth => (StatusCode::UNAUTHORIZED, None),
            AdsLibraryRateLimit { retry_after_secs } => {
                (StatusCode::TOO_MANY_REQUESTS, *retry_after_secs)
            }
            AdsLibrary(reason) if reason.contains("timeout") || reason.contains("timed out") => {
                (StatusCode::GATEWAY_TIMEOUT, None)
            }
            Scraping { reason, .. } if reason.contains("timeout") || reason.contains("timed out") => {
                (StatusCode::GATEWAY_TIMEOUT, None)
            }
            AdsLibrary(_) | Scraping { .. } | SitemapNotFound(_) | SitemapParse { .. } => {
                (StatusCode::BAD_GATEWAY, None)
            }
            Repository { .. } => (StatusCode::INTERNAL_SERVER_ERROR, None),
            TaskDispatch { .. } => (StatusCode::SERVICE_UNAVAILABLE, None),
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
