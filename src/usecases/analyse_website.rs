//! Site analysis use case.
//!
//! Fetches a storefront's HTML and headers, decides whether it runs on
//! the commerce platform we track, extracts shop metadata and chains a
//! catalog-sizing task on a positive verdict.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Category, CommerceProfile, Currency, DomainError, DomainResult, PaymentMethod,
    PaymentMethods, Url,
};
use crate::ports::{
    CommerceProfileRepository, HtmlScraperPort, PageRepository, TaskDispatcherPort, TaskRequest,
};

/// Body signatures of the commerce platform: CDN host, inline script
/// hooks, section-class prefix, checkout globals.
const PLATFORM_BODY_PATTERNS: &[&str] = &[
    r"cdn\.shopify\.com",
    r"Shopify\.theme",
    r"shopify-section",
    r"shopify\.com/services",
    r"myshopify\.com",
    r#""shopify""#,
    r"Shopify\.checkout",
];

const PLATFORM_HEADER: &str = "x-shopify-stage";
const PLATFORM_SERVER_BANNER: &str = "shopify";

lazy_static! {
    static ref BODY_SIGNATURES: Vec<Regex> = PLATFORM_BODY_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect();
    static ref SHOP_NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"(?i)<meta[^>]*property="og:site_name"[^>]*content="([^"]+)""#).unwrap(),
        Regex::new(r#"(?i)<meta[^>]*name="application-name"[^>]*content="([^"]+)""#).unwrap(),
        Regex::new(r#"(?i)"shop_name"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r"(?i)<title>([^<|]+)").unwrap(),
    ];
    static ref THEME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"(?i)Shopify\.theme\s*=\s*\{[^}]*"name"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r"(?i)theme-([a-zA-Z0-9-]+)").unwrap(),
        Regex::new(r#"(?i)data-theme="([^"]+)""#).unwrap(),
    ];
    static ref CURRENCY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#""currency"\s*:\s*"([A-Z]{3})""#).unwrap(),
        Regex::new(r#"data-currency="([A-Z]{3})""#).unwrap(),
        Regex::new(r#"Shopify\.currency\.active\s*=\s*"([A-Z]{3})""#).unwrap(),
    ];
    static ref PAYMENT_PATTERNS: Vec<(PaymentMethod, Vec<Regex>)> = vec![
        (PaymentMethod::Paypal, rx(&["paypal", "pp-button"])),
        (PaymentMethod::ApplePay, rx(&["apple.?pay", "apple-pay-button"])),
        (PaymentMethod::GooglePay, rx(&["google.?pay", "gpay"])),
        (PaymentMethod::ShopPay, rx(&["shop.?pay", "shopify.?pay"])),
        (PaymentMethod::Klarna, rx(&["klarna"])),
        (PaymentMethod::Afterpay, rx(&["afterpay", "clearpay"])),
        (PaymentMethod::Affirm, rx(&["affirm"])),
        (PaymentMethod::CreditCard, rx(&["credit.?card", "visa", "mastercard", "amex"])),
    ];
    static ref CATEGORY_PATTERNS: Vec<(&'static str, Vec<Regex>)> = vec![
        ("fashion", rx(&["fashion", "clothing", "apparel", "wear", "dress"])),
        ("beauty", rx(&["beauty", "cosmetic", "skincare", "makeup"])),
        ("electronics", rx(&["electronic", "gadget", "tech", "phone"])),
        ("home", rx(&["home", "furniture", "decor", "kitchen"])),
        ("jewelry", rx(&["jewelry", "jewellery", "ring", "necklace"])),
        ("sports", rx(&["sport", "fitness", "gym", "athletic"])),
        ("pets", rx(&["pet", "dog", "cat", "animal"])),
        ("kids", rx(&["kid", "baby", "child", "toy"])),
    ];
}

fn rx(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

#[derive(Debug, Clone)]
pub struct AnalyseWebsiteResult {
    pub page_id: String,
    pub is_commerce: bool,
    pub shop_name: Option<String>,
    pub theme: Option<String>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub payment_methods: Vec<PaymentMethod>,
    pub sitemap_count_dispatched: bool,
}

pub struct AnalyseWebsiteUseCase {
    scraper: Arc<dyn HtmlScraperPort>,
    pages: Arc<dyn PageRepository>,
    profiles: Arc<dyn CommerceProfileRepository>,
    dispatcher: Arc<dyn TaskDispatcherPort>,
}

impl AnalyseWebsiteUseCase {
    pub fn new(
        scraper: Arc<dyn HtmlScraperPort>,
        pages: Arc<dyn PageRepository>,
        profiles: Arc<dyn CommerceProfileRepository>,
        dispatcher: Arc<dyn TaskDispatcherPort>,
    ) -> Self {
        Self {
            scraper,
            pages,
            profiles,
            dispatcher,
        }
    }

    pub async fn execute(&self, page_id: &str, url: &Url) -> DomainResult<AnalyseWebsiteResult> {
        info!(page_id = %page_id, url = %url, "Starting website analysis");

        let mut page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        let html = self.scraper.fetch_html(url).await?;
        let headers = self.scraper.fetch_headers(url).await?;

        let is_commerce = detect_commerce_platform(&html, &headers);

        page.begin_analysis()?;

        if !is_commerce {
            page.mark_as_not_commerce()?;
            page.record_scan();
            self.pages.save(&page).await?;

            info!(page_id = %page_id, is_commerce = false, "Website analysis completed");
            return Ok(AnalyseWebsiteResult {
                page_id: page_id.to_string(),
                is_commerce: false,
                shop_name: None,
                theme: None,
                currency: None,
                category: None,
                payment_methods: Vec::new(),
                sitemap_count_dispatched: false,
            });
        }

        let shop_name = extract_shop_name(&html).or_else(|| Some(url.domain()));
        let theme = extract_theme(&html);
        let currency_code = extract_currency(&html);
        let category_name = detect_category(&html);
        let payment_methods = detect_payment_methods(&html);

        let profile_id = Uuid::new_v4().to_string();
        let mut profile = CommerceProfile::new(profile_id.clone(), page_id.to_string());
        profile.shop_name = shop_name.clone();
        profile.theme = theme.clone();
        profile.payment_methods = payment_methods.iter().copied().collect::<PaymentMethods>();
        self.profiles.save(&profile).await?;

        page.mark_as_commerce(profile_id)?;
        if let Some(code) = &currency_code {
            if let Ok(currency) = Currency::parse(code) {
                page.set_currency(currency);
            }
        }
        if let Some(name) = &category_name {
            if let Ok(category) = Category::parse(name) {
                page.set_category(category);
            }
        }
        page.record_scan();
        self.pages.save(&page).await?;

        self.dispatcher
            .dispatch(TaskRequest::CountSitemapProducts {
                page_id: page_id.to_string(),
                website: url.clone(),
                country: page.country,
            })
            .await?;

        info!(
            page_id = %page_id,
            is_commerce = true,
            shop_name = ?shop_name,
            theme = ?theme,
            "Website analysis completed"
        );

        Ok(AnalyseWebsiteResult {
            page_id: page_id.to_string(),
            is_commerce: true,
            shop_name,
            theme,
            currency: currency_code,
            category: category_name,
            payment_methods,
            sitemap_count_dispatched: true,
        })
    }
}

/// Header signals short-circuit body scanning.
pub(crate) fn detect_commerce_platform(html: &str, headers: &HashMap<String, String>) -> bool {
    if let Some(server) = headers.get("server") {
        if server.to_lowercase().contains(PLATFORM_SERVER_BANNER) {
            return true;
        }
    }
    if headers.contains_key(PLATFORM_HEADER) {
        return true;
    }
    BODY_SIGNATURES.iter().any(|p| p.is_match(html))
}

pub(crate) fn extract_shop_name(html: &str) -> Option<String> {
    for pattern in SHOP_NAME_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(html) {
            let name = captures.get(1)?.as_str().trim();
            if !name.is_empty() && name.len() < 100 {
                return Some(name.to_string());
            }
        }
    }
    None
}

pub(crate) fn extract_theme(html: &str) -> Option<String> {
    THEME_PATTERNS
        .iter()
        .find_map(|p| p.captures(html).map(|c| c[1].to_string()))
}

pub(crate) fn extract_currency(html: &str) -> Option<String> {
    CURRENCY_PATTERNS
        .iter()
        .find_map(|p| p.captures(html).map(|c| c[1].to_string()))
}

/// First matching alias records the method.
pub(crate) fn detect_payment_methods(html: &str) -> Vec<PaymentMethod> {
    let html_lower = html.to_lowercase();
    PAYMENT_PATTERNS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| p.is_match(&html_lower)))
        .map(|(method, _)| *method)
        .collect()
}

/// Category with the highest non-zero hit count wins.
pub(crate) fn detect_category(html: &str) -> Option<String> {
    let html_lower = html.to_lowercase();
    CATEGORY_PATTERNS
        .iter()
        .map(|(name, patterns)| {
            let hits: usize = patterns.iter().map(|p| p.find_iter(&html_lower).count()).sum();
            (*name, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .max_by_key(|(_, hits)| *hits)
        .map(|(name, _)| name.to_string())
}
