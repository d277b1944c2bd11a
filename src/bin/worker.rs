//! ShopScope worker.
//!
//! Executes tasks from the durable queue and enqueues the daily
//! metrics snapshot on a fixed schedule.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::interval;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopscope_backend::ports::TaskRequest;
use shopscope_backend::queue::Worker;
use shopscope_backend::services::build_services;
use shopscope_backend::Config;

#[derive(Debug, Parser)]
#[command(name = "shopscope-worker", about = "Task queue worker")]
struct Args {
    /// Queue poll interval in seconds (overrides WORKER_POLL_INTERVAL)
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Hours between daily-metrics snapshot enqueues
    #[arg(long, default_value_t = 24)]
    snapshot_interval_hours: u64,

    /// Disable the snapshot scheduler (another worker owns it)
    #[arg(long, default_value_t = false)]
    no_snapshot_schedule: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    init_tracing(&config);

    info!("👷 ShopScope worker starting");

    let services = build_services(&config)?;

    let poll_interval = args
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.worker_poll_interval);

    if !args.no_snapshot_schedule {
        let queue = services.queue.clone();
        let every = Duration::from_secs(args.snapshot_interval_hours * 3600);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            // the immediate first tick would double-snapshot on restart
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = queue.enqueue(&TaskRequest::SnapshotDailyMetrics) {
                    error!(error = %err, "Failed to enqueue daily snapshot");
                } else {
                    info!("📅 Daily metrics snapshot enqueued");
                }
            }
        });
    }

    Worker::new(services, poll_interval).run().await;
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));

    if config.log_format == "detailed" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
