//! Entry point: config parsing, logging, the flush scheduler, and serve.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pointdb_server::{serve, AppState, SeriesRegistry, ServerConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// PointDB time-series point store.
#[derive(Debug, Parser)]
#[command(name = "pointdb-server", version, about)]
struct Args {
    /// Bind address.
    #[arg(long, env = "POINTDB_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "POINTDB_PORT", default_value_t = 8080)]
    port: u16,

    /// Seconds points stay in a series' hot buffer before flush promotes
    /// them to the archive.
    #[arg(long, env = "POINTDB_RETENTION_SECS", default_value_t = 900)]
    retention_secs: u64,

    /// Seconds between scheduled flushes across all series.
    #[arg(long, env = "POINTDB_FLUSH_INTERVAL_SECS", default_value_t = 60)]
    flush_interval_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            retention: Duration::from_secs(self.retention_secs),
            flush_interval: Duration::from_secs(self.flush_interval_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();
    let registry = Arc::new(SeriesRegistry::new());

    // The engine never flushes on its own; this task is the external
    // scheduler that drives age-based promotion.
    let flusher = registry.clone();
    let flush_interval = config.flush_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(flush_interval);
        ticker.tick().await; // the first tick fires immediately
        loop {
            ticker.tick().await;
            let promoted = flusher.flush_all();
            if promoted > 0 {
                debug!(promoted, "scheduled flush");
            }
        }
    });

    info!(
        host = config.host.as_str(),
        port = config.port,
        retention_secs = config.retention.as_secs(),
        "starting pointdb-server"
    );
    let state = AppState::new(registry, &config);
    serve(&config, state).await
}
