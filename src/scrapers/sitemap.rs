//! Sitemap discovery and product counting.
//!
//! Probes the common sitemap locations at the host root, parses both
//! sitemap-index and urlset documents (with or without the
//! sitemaps.org namespace), prioritizes product sitemaps and counts
//! product-pattern URLs with a locale filter.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::domain::{Country, DomainError, DomainResult, ProductCount, Url};
use crate::ports::SitemapPort;

const SITEMAP_TIMEOUT: Duration = Duration::from_secs(15);

/// Probe order at the host root.
const SITEMAP_LOCATIONS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemaps.xml"];

/// Locale codes recognized inside URLs.
const LOCALE_CODES: &[&str] = &["fr", "en", "de", "es", "it", "nl", "pt"];

lazy_static! {
    /// Product sitemap name patterns, most specific first.
    static ref PRODUCT_SITEMAP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)sitemap_products_[a-z]{2}_\d+\.xml").unwrap(),
        Regex::new(r"(?i)sitemap_products_\d+\.xml").unwrap(),
        Regex::new(r"(?i)sitemap_products\.xml").unwrap(),
        Regex::new(r"(?i)products.*sitemap.*\.xml").unwrap(),
        Regex::new(r"(?i)sitemap.*products.*\.xml").unwrap(),
    ];
    static ref PRODUCT_URL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)/products/").unwrap(),
        Regex::new(r"(?i)/product/").unwrap(),
        Regex::new(r"(?i)/p/").unwrap(),
        Regex::new(r"(?i)/shop/").unwrap(),
    ];
}

/// Parsed shape of one sitemap document.
#[derive(Debug, PartialEq)]
pub(crate) enum SitemapDocument {
    /// `<sitemapindex>` listing child sitemap URLs.
    Index(Vec<String>),
    /// `<urlset>` listing page URLs.
    UrlSet(Vec<String>),
    Empty,
}

pub struct SitemapClient {
    client: Client,
}

impl SitemapClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> DomainResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(SITEMAP_TIMEOUT)
            .header("Accept", "application/xml, text/xml")
            .send()
            .await
            .map_err(|e| DomainError::Scraping {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DomainError::Scraping {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response.text().await.map_err(|e| DomainError::Scraping {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
        })
    }
}

#[async_trait]
impl SitemapPort for SitemapClient {
    async fn get_sitemap_urls(&self, website: &Url) -> DomainResult<Vec<Url>> {
        info!(website = %website, "Discovering sitemaps");

        let base = website.base();
        let mut discovered: Vec<String> = Vec::new();

        for location in SITEMAP_LOCATIONS {
            let probe = format!("{}{}", base, location);
            let content = match self.fetch(&probe).await {
                Ok(content) => content,
                Err(err) => {
                    debug!(url = %probe, error = %err, "Sitemap probe failed");
                    continue;
                }
            };

            match parse_sitemap_document(&content) {
                Ok(SitemapDocument::Index(children)) if !children.is_empty() => {
                    discovered = children;
                    break;
                }
                Ok(SitemapDocument::UrlSet(_)) => {
                    // a plain sitemap: count it directly
                    discovered = vec![probe];
                    break;
                }
                Ok(_) => continue,
                Err(reason) => {
                    debug!(url = %probe, reason = %reason, "Sitemap probe parse failed");
                    continue;
                }
            }
        }

        if discovered.is_empty() {
            warn!(website = %website, "No sitemaps found");
            return Err(DomainError::SitemapNotFound(website.to_string()));
        }

        let prioritized = prioritize_product_sitemaps(discovered);
        info!(website = %website, sitemaps = prioritized.len(), "Sitemaps discovered");

        Ok(prioritized
            .into_iter()
            .filter_map(|u| Url::parse(&u).ok())
            .collect())
    }

    async fn extract_product_count(
        &self,
        sitemap_urls: &[Url],
        country: Country,
    ) -> DomainResult<ProductCount> {
        info!(sitemaps = sitemap_urls.len(), country = %country, "Extracting product count");

        let country_code = country.code().to_lowercase();
        let mut total: u32 = 0;

        for sitemap_url in sitemap_urls {
            let content = match self.fetch(sitemap_url.as_str()).await {
                Ok(content) => content,
                Err(err) => {
                    warn!(sitemap = %sitemap_url, error = %err, "Failed to fetch sitemap, skipping");
                    continue;
                }
            };

            let urls = match parse_sitemap_document(&content) {
                Ok(SitemapDocument::UrlSet(urls)) => urls,
                Ok(_) => Vec::new(),
                Err(reason) => {
                    warn!(sitemap = %sitemap_url, reason = %reason, "Failed to parse sitemap, skipping");
                    continue;
                }
            };

            total += count_products(&urls, &country_code);
        }

        info!(total_products = total, country = %country, "Product count extracted");
        ProductCount::new(total as i64)
    }
}

/// Count product-pattern URLs that pass the locale filter.
pub(crate) fn count_products(urls: &[String], country_code: &str) -> u32 {
    urls.iter()
        .filter(|url| is_product_url(url) && matches_country(url, country_code))
        .count() as u32
}

/// Namespace-agnostic parse of a sitemap document; matches elements by
/// local name so both the sitemaps.org and the bare variant decode.
pub(crate) fn parse_sitemap_document(content: &str) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut sitemap_locs: Vec<String> = Vec::new();
    let mut url_locs: Vec<String> = Vec::new();
    let mut saw_index_root = false;
    let mut saw_urlset_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if stack.is_empty() {
                    saw_index_root |= name == b"sitemapindex";
                    saw_urlset_root |= name == b"urlset";
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                if stack.last().map(|n| n.as_slice()) == Some(b"loc") {
                    let text = t
                        .unescape()
                        .map_err(|e| e.to_string())?
                        .trim()
                        .to_string();
                    if !text.is_empty() {
                        let parent = stack
                            .len()
                            .checked_sub(2)
                            .and_then(|i| stack.get(i))
                            .map(|n| n.as_slice());
                        match parent {
                            Some(b"sitemap") => sitemap_locs.push(text),
                            Some(b"url") => url_locs.push(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    if !sitemap_locs.is_empty() || (saw_index_root && url_locs.is_empty() && !saw_urlset_root) {
        return Ok(SitemapDocument::Index(sitemap_locs));
    }
    if !url_locs.is_empty() || saw_urlset_root {
        return Ok(SitemapDocument::UrlSet(url_locs));
    }
    Ok(SitemapDocument::Empty)
}

/// Stable partition: product sitemaps first, original order otherwise.
pub(crate) fn prioritize_product_sitemaps(urls: Vec<String>) -> Vec<String> {
    let (mut products, others): (Vec<String>, Vec<String>) = urls
        .into_iter()
        .partition(|url| PRODUCT_SITEMAP_PATTERNS.iter().any(|p| p.is_match(url)));
    products.extend(others);
    products
}

pub(crate) fn is_product_url(url: &str) -> bool {
    PRODUCT_URL_PATTERNS.iter().any(|p| p.is_match(url))
}

/// URLs without any locale indicator always count; URLs carrying one
/// must match the requested country code.
pub(crate) fn matches_country(url: &str, country_code: &str) -> bool {
    let url_lower = url.to_lowercase();

    let has_locale = LOCALE_CODES.iter().any(|code| {
        url_lower.contains(&format!("/{}/", code)) || url_lower.contains(&format!("_{}_", code))
    });
    if !has_locale {
        return true;
    }

    [
        format!("/{}/", country_code),
        format!("/{}-", country_code),
        format!("_{}_", country_code),
        format!("_{}.", country_code),
        format!(".{}/", country_code),
    ]
    .iter()
    .any(|pattern| url_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://shop.example.com/sitemap_products_fr_1.xml</loc></sitemap>
  <sitemap><loc>https://shop.example.com/sitemap_pages.xml</loc></sitemap>
</sitemapindex>"#;

    const URLSET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://shop.example.com/fr/products/lamp</loc></url>
  <url><loc>https://shop.example.com/en/products/chair</loc></url>
  <url><loc>https://shop.example.com/products/table</loc></url>
  <url><loc>https://shop.example.com/pages/about</loc></url>
</urlset>"#;

    const NO_NAMESPACE_XML: &str = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://shop.example.com/products/one</loc></url>
</urlset>"#;

    #[test]
    fn index_documents_yield_child_sitemaps() {
        let doc = parse_sitemap_document(INDEX_XML).unwrap();
        match doc {
            SitemapDocument::Index(children) => {
                assert_eq!(children.len(), 2);
                assert!(children[0].contains("sitemap_products_fr_1.xml"));
            }
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn urlset_documents_yield_page_urls() {
        let doc = parse_sitemap_document(URLSET_XML).unwrap();
        match doc {
            SitemapDocument::UrlSet(urls) => assert_eq!(urls.len(), 4),
            other => panic!("expected urlset, got {:?}", other),
        }
    }

    #[test]
    fn namespace_free_sitemaps_parse_too() {
        let doc = parse_sitemap_document(NO_NAMESPACE_XML).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec!["https://shop.example.com/products/one".to_string()])
        );
    }

    #[test]
    fn garbage_input_yields_no_sitemap_entries() {
        match parse_sitemap_document("this is not xml") {
            Ok(doc) => assert_eq!(doc, SitemapDocument::Empty),
            Err(_) => {}
        }
    }

    #[test]
    fn product_sitemaps_are_prioritized_stably() {
        let ordered = prioritize_product_sitemaps(vec![
            "https://s/sitemap_pages.xml".into(),
            "https://s/sitemap_products_1.xml".into(),
            "https://s/sitemap_blogs.xml".into(),
            "https://s/sitemap_products_fr_1.xml".into(),
        ]);
        assert_eq!(ordered[0], "https://s/sitemap_products_1.xml");
        assert_eq!(ordered[1], "https://s/sitemap_products_fr_1.xml");
        assert_eq!(ordered[2], "https://s/sitemap_pages.xml");
    }

    #[test]
    fn product_url_patterns() {
        assert!(is_product_url("https://s/products/lamp"));
        assert!(is_product_url("https://s/p/123"));
        assert!(is_product_url("https://s/shop/item"));
        assert!(!is_product_url("https://s/pages/about"));
    }

    #[test]
    fn locale_filter_keeps_requested_country_and_unmarked_urls() {
        // FR requested: /fr/ counts, /en/ does not, unmarked counts
        assert!(matches_country("https://s/fr/products/lamp", "fr"));
        assert!(!matches_country("https://s/en/products/lamp", "fr"));
        assert!(matches_country("https://s/products/lamp", "fr"));
        // US requested: locale-free URLs all count
        assert!(matches_country("https://s/products/lamp", "us"));
        assert!(!matches_country("https://s/fr/products/lamp", "us"));
    }

    #[test]
    fn count_products_applies_both_filters() {
        let urls: Vec<String> = vec![
            "https://s/fr/products/a".into(),
            "https://s/fr/products/b".into(),
            "https://s/en/products/c".into(),
            "https://s/products/d".into(),
            "https://s/pages/about".into(),
        ];
        assert_eq!(count_products(&urls, "fr"), 3);
        assert_eq!(count_products(&urls, "us"), 1);
    }
}
