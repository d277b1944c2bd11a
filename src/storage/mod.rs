//! SQLite persistence adapters.

pub mod ads;
pub mod alerts;
pub mod creative;
pub mod database;
pub mod metrics;
pub mod pages;
pub mod products;
pub mod queue;
pub mod scans;
pub mod scoring;
mod support;
pub mod watchlists;

pub use ads::SqliteAdsRepository;
pub use alerts::SqliteAlertRepository;
pub use creative::SqliteCreativeAnalysisRepository;
pub use database::Database;
pub use metrics::SqlitePageMetricsRepository;
pub use pages::SqlitePageRepository;
pub use products::{SqliteCommerceProfileRepository, SqliteProductRepository};
pub use queue::{QueuedTask, TaskQueue};
pub use scans::{SqliteBlacklistRepository, SqliteKeywordRunRepository, SqliteScanRepository};
pub use scoring::SqliteScoringRepository;
pub use watchlists::SqliteWatchlistRepository;
