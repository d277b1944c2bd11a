//! Sitemap discovery against a local HTTP stub, covering the fallback
//! probe order and the locale filter.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use shopscope_backend::domain::{Country, Url};
use shopscope_backend::ports::SitemapPort;
use shopscope_backend::scrapers::SitemapClient;

fn index_xml(base: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/sitemap_products_fr_1.xml</loc></sitemap>
</sitemapindex>"#
    )
}

fn products_xml(base: &str, localized: bool) -> String {
    let mut urls = String::new();
    if localized {
        for i in 0..5 {
            urls.push_str(&format!(
                "<url><loc>{base}/fr/products/item-{i}</loc></url>"
            ));
        }
        for i in 0..7 {
            urls.push_str(&format!(
                "<url><loc>{base}/en/products/item-{i}</loc></url>"
            ));
        }
    } else {
        for i in 0..12 {
            urls.push_str(&format!("<url><loc>{base}/products/item-{i}</loc></url>"));
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}</urlset>"#
    )
}

/// Serve a site whose /sitemap.xml 404s and whose /sitemap_index.xml
/// points at one product sitemap.
async fn spawn_stub(localized: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base = format!("http://{}", addr);

    let index_body = index_xml(&base);
    let products_body = products_xml(&base, localized);

    let app = Router::new()
        .route("/sitemap.xml", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/sitemap_index.xml",
            get(move || {
                let body = index_body.clone();
                async move { ([("content-type", "application/xml")], body) }
            }),
        )
        .route(
            "/sitemap_products_fr_1.xml",
            get(move || {
                let body = products_body.clone();
                async move { ([("content-type", "application/xml")], body) }
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    base
}

#[tokio::test]
async fn falls_back_to_sitemap_index_and_filters_by_locale() {
    let base = spawn_stub(true).await;
    let client = SitemapClient::new(reqwest::Client::new());
    let website = Url::parse(&base).unwrap();

    let sitemaps = client.get_sitemap_urls(&website).await.unwrap();
    assert_eq!(sitemaps.len(), 1);
    assert!(sitemaps[0].as_str().contains("sitemap_products_fr_1.xml"));

    // 5 /fr/ URLs match FR; the 7 /en/ URLs are filtered out
    let count = client
        .extract_product_count(&sitemaps, Country::parse("FR").unwrap())
        .await
        .unwrap();
    assert_eq!(count.value(), 5);
}

#[tokio::test]
async fn urls_without_locale_indicator_all_count() {
    let base = spawn_stub(false).await;
    let client = SitemapClient::new(reqwest::Client::new());
    let website = Url::parse(&base).unwrap();

    let sitemaps = client.get_sitemap_urls(&website).await.unwrap();
    let count = client
        .extract_product_count(&sitemaps, Country::parse("US").unwrap())
        .await
        .unwrap();
    assert_eq!(count.value(), 12);
}

#[tokio::test]
async fn site_without_any_sitemap_reports_not_found() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", get(|| async { "hello" }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let client = SitemapClient::new(reqwest::Client::new());
    let website = Url::parse(&format!("http://{}", addr)).unwrap();
    let result = client.get_sitemap_urls(&website).await;
    assert!(matches!(
        result,
        Err(shopscope_backend::domain::DomainError::SitemapNotFound(_))
    ));
}
