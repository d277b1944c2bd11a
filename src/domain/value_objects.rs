//! Validated value objects shared across the domain.
//!
//! Each type rejects invalid input at construction so the rest of the
//! pipeline can trust its fields. All are cheap to clone.

use std::collections::BTreeSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{DomainError, DomainResult};

// ISO 3166-1 alpha-2 country codes (subset of the markets we track)
const VALID_COUNTRY_CODES: &[&str] = &[
    // Europe
    "FR", "DE", "GB", "ES", "IT", "PT", "NL", "BE", "CH", "AT", "PL", "SE", "NO", "DK", "FI",
    "IE", "GR", "CZ", "RO", "HU", "SK", "BG", "HR", "SI", "LT", "LV", "EE", "LU", "MT", "CY",
    // North America
    "US", "CA", "MX",
    // South America
    "BR", "AR", "CL", "CO", "PE", "VE", "EC", "UY",
    // Asia
    "CN", "JP", "KR", "IN", "ID", "TH", "VN", "MY", "SG", "PH", "TW", "HK", "AE", "SA", "IL",
    "TR",
    // Oceania
    "AU", "NZ",
    // Africa
    "ZA", "EG", "NG", "MA", "KE",
];

const VALID_LANGUAGE_CODES: &[&str] = &[
    "en", "fr", "de", "es", "it", "pt", "nl", "pl", "sv", "no", "da", "fi", "el", "cs", "ro",
    "hu", "sk", "bg", "hr", "sl", "lt", "lv", "et", "ru", "uk", "zh", "ja", "ko", "hi", "id",
    "th", "vi", "ms", "tl", "ar", "he", "tr",
];

const VALID_CURRENCY_CODES: &[&str] = &[
    "EUR", "USD", "GBP", "AUD", "CAD", "CHF", "SEK", "NOK", "DKK", "PLN", "CZK", "RON", "HUF",
    "BGN", "HRK", "BRL", "ARS", "CLP", "COP", "PEN", "MXN", "CNY", "JPY", "KRW", "INR", "IDR",
    "THB", "VND", "MYR", "SGD", "PHP", "TWD", "HKD", "AED", "SAR", "ILS", "TRY", "NZD", "ZAR",
    "EGP", "NGN", "MAD", "KES",
];

const PREDEFINED_CATEGORIES: &[&str] = &[
    "fashion", "beauty", "electronics", "home", "jewelry", "sports", "pets", "kids", "food",
    "health", "outdoor", "automotive", "office", "art", "uncategorized",
];

lazy_static! {
    static ref URL_PATTERN: Regex =
        Regex::new(r"^https?://[a-zA-Z0-9]([a-zA-Z0-9\-._~%]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-._~%]*[a-zA-Z0-9])?)*(:\d+)?(/\S*)?$").unwrap();
}

/// Validated HTTP/HTTPS URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Url(String);

impl Url {
    pub fn parse(value: &str) -> DomainResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !URL_PATTERN.is_match(trimmed) {
            return Err(DomainError::InvalidUrl(value.to_string()));
        }
        // Reject scheme-only / hostless inputs the pattern lets through
        let after_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| DomainError::InvalidUrl(value.to_string()))?;
        if after_scheme.is_empty() || after_scheme.starts_with('/') {
            return Err(DomainError::InvalidUrl(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Registrable host of the URL, without any `www.` prefix or port.
    pub fn domain(&self) -> String {
        let after_scheme = self
            .0
            .splitn(2, "://")
            .nth(1)
            .unwrap_or(&self.0);
        let host = after_scheme
            .split('/')
            .next()
            .unwrap_or(after_scheme)
            .split(':')
            .next()
            .unwrap_or(after_scheme);
        host.strip_prefix("www.").unwrap_or(host).to_lowercase()
    }

    /// Scheme + host, with path and query stripped.
    pub fn base(&self) -> String {
        let mut parts = self.0.splitn(2, "://");
        let scheme = parts.next().unwrap_or("https");
        let rest = parts.next().unwrap_or("");
        let host = rest.split('/').next().unwrap_or(rest);
        format!("{}://{}", scheme, host)
    }

    pub fn is_https(&self) -> bool {
        self.0.starts_with("https://")
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 3166-1 alpha-2 country code from the closed tracking set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Country([u8; 2]);

impl serde::Serialize for Country {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> serde::Deserialize<'de> for Country {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Country::parse(&code).map_err(serde::de::Error::custom)
    }
}

impl Country {
    pub fn parse(code: &str) -> DomainResult<Self> {
        let normalized = code.trim().to_uppercase();
        if normalized.len() != 2 || !VALID_COUNTRY_CODES.contains(&normalized.as_str()) {
            return Err(DomainError::InvalidCountry(code.to_string()));
        }
        let bytes = normalized.as_bytes();
        Ok(Self([bytes[0], bytes[1]]))
    }

    pub fn code(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// ISO 639-1 language code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn parse(code: &str) -> DomainResult<Self> {
        let normalized = code.trim().to_lowercase();
        if normalized.len() != 2 || !VALID_LANGUAGE_CODES.contains(&normalized.as_str()) {
            return Err(DomainError::InvalidLanguage(code.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 4217 currency code from the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> DomainResult<Self> {
        let normalized = code.trim().to_uppercase();
        if normalized.len() != 3 || !VALID_CURRENCY_CODES.contains(&normalized.as_str()) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Currencies of premium advertising markets.
    pub fn is_strong(&self) -> bool {
        matches!(self.0.as_str(), "EUR" | "USD" | "GBP" | "AUD")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounded non-negative count of catalog products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCount(u32);

impl ProductCount {
    pub const MAX: u32 = 1_000_000;

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 || value > Self::MAX as i64 {
            return Err(DomainError::InvalidProductCount(value));
        }
        Ok(Self(value as u32))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProductCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized lowercase shop category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn parse(value: &str) -> DomainResult<Self> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() || normalized.len() > 64 {
            return Err(DomainError::InvalidCategory(value.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn uncategorized() -> Self {
        Self("uncategorized".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_predefined(&self) -> bool {
        PREDEFINED_CATEGORIES.contains(&self.0.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UUID v4 identifier for scan operations (case-insensitive parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidScanId(value.to_string()))
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Known checkout payment methods detectable on storefronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Paypal,
    ApplePay,
    GooglePay,
    ShopPay,
    Klarna,
    Afterpay,
    Affirm,
    CreditCard,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 8] = [
        PaymentMethod::Paypal,
        PaymentMethod::ApplePay,
        PaymentMethod::GooglePay,
        PaymentMethod::ShopPay,
        PaymentMethod::Klarna,
        PaymentMethod::Afterpay,
        PaymentMethod::Affirm,
        PaymentMethod::CreditCard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::ApplePay => "apple_pay",
            PaymentMethod::GooglePay => "google_pay",
            PaymentMethod::ShopPay => "shop_pay",
            PaymentMethod::Klarna => "klarna",
            PaymentMethod::Afterpay => "afterpay",
            PaymentMethod::Affirm => "affirm",
            PaymentMethod::CreditCard => "credit_card",
        }
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "paypal" => Ok(PaymentMethod::Paypal),
            "apple_pay" => Ok(PaymentMethod::ApplePay),
            "google_pay" => Ok(PaymentMethod::GooglePay),
            "shop_pay" => Ok(PaymentMethod::ShopPay),
            "klarna" => Ok(PaymentMethod::Klarna),
            "afterpay" => Ok(PaymentMethod::Afterpay),
            "affirm" => Ok(PaymentMethod::Affirm),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            other => Err(DomainError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Ordered set of payment methods accepted by a storefront.
pub type PaymentMethods = BTreeSet<PaymentMethod>;

/// Filters and pagination for the ranked-shop read model.
///
/// Construction clamps limit/offset and validates the optional filters,
/// so repository code never sees out-of-range values.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingCriteria {
    pub limit: u32,
    pub offset: u32,
    pub tier: Option<String>,
    pub min_score: Option<f64>,
    pub country: Option<Country>,
}

impl RankingCriteria {
    pub const MIN_LIMIT: u32 = 1;
    pub const MAX_LIMIT: u32 = 200;
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(
        limit: Option<u32>,
        offset: Option<u32>,
        tier: Option<&str>,
        min_score: Option<f64>,
        country: Option<&str>,
    ) -> DomainResult<Self> {
        let limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(Self::MIN_LIMIT, Self::MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        let tier = match tier {
            Some(t) => {
                let normalized = t.trim().to_uppercase();
                if !super::tiering::is_valid_tier(&normalized) {
                    return Err(DomainError::InvalidRankingCriteria(format!(
                        "unknown tier '{}'",
                        t
                    )));
                }
                Some(normalized)
            }
            None => None,
        };

        let min_score = min_score.map(|s| s.clamp(0.0, 100.0));

        let country = match country {
            Some(c) => Some(
                Country::parse(c)
                    .map_err(|_| DomainError::InvalidRankingCriteria(format!("country '{}'", c)))?,
            ),
            None => None,
        };

        Ok(Self {
            limit,
            offset,
            tier,
            min_score,
            country,
        })
    }

    /// Score range for the tier filter, from the canonical table.
    pub fn tier_score_range(&self) -> Option<(f64, f64)> {
        self.tier
            .as_deref()
            .and_then(|t| super::tiering::tier_to_score_range(t).ok())
    }
}

impl Default for RankingCriteria {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            tier: None,
            min_score: None,
            country: None,
        }
    }
}
