//! WordPress publisher service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client POST (JSON or form)
//!        │
//!        ▼
//!   ┌──────────┐   ┌────────────┐   ┌──────────────────────────────────────┐
//!   │  http    │──▶│  publish   │──▶│ wordpress                            │
//!   │ server   │   │ params +   │   │ GET image → POST media → POST posts  │
//!   │ + layers │   │ validation │   └──────────────────────────────────────┘
//!   └──────────┘   └────────────┘
//!        │
//!        ▼
//!   JSON envelope (success or classified failure)
//!
//!   Cross-cutting: config · observability · lifecycle · admin/keys
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use wp_publisher::config::{load_config, PublisherConfig};
use wp_publisher::lifecycle::{Shutdown, StartupError};
use wp_publisher::observability::{logging, metrics};
use wp_publisher::HttpServer;

#[derive(Parser)]
#[command(name = "wp-publisher", version, about = "WordPress post publishing service")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "WP_PUBLISHER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PublisherConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wp-publisher starting");

    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
