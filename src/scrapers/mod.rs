//! Outbound HTTP adapters and the heuristic text analyzer.

pub mod ads_library;
pub mod creative_analyzer;
pub mod html_scraper;
pub mod product_extractor;
pub mod sitemap;

pub use ads_library::{AdsLibraryClient, AdsLibraryConfig};
pub use creative_analyzer::{CreativeTextAnalyzer, ANALYZER_VERSION};
pub use html_scraper::HtmlScraper;
pub use product_extractor::ProductFeedExtractor;
pub use sitemap::SitemapClient;
