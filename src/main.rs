//! Edge gateway.
//!
//! Forwards selected HTTP requests to a backend through a fixed pool of
//! workers, each keeping one persistent connection open.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     EDGE GATEWAY                      │
//!                      │                                                       │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐        │
//!   ───────────────────┼─▶│  http   │──▶│  binder  │──▶│   handler    │        │
//!                      │  │ server  │   │(Dispatch-│   │ BackendReq.  │        │
//!                      │  └─────────┘   │ er ext.) │   └──────┬───────┘        │
//!                      │                └──────────┘          │ Dispatcher     │
//!                      │                                      ▼                │
//!                      │                            ┌──────────────────┐       │
//!                      │                            │   SharedQueue    │       │
//!                      │                            │ (bounded, MPMC)  │       │
//!                      │                            └───┬─────┬─────┬──┘       │
//!                      │                                ▼     ▼     ▼          │
//!                      │                             worker worker worker      │
//!                      │                               0      1      2         │
//!                      │                               │      │      │ persistent
//!                      │                               └──────┴──────┴────────┼──▶ Backend
//!   Client Response    │   oneshot reply per request                           │
//!   ◀──────────────────┼───────────────────────────────────────────────────────│
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::backend::HttpConnector;
use edge_gateway::config::{load_config, override_bind_address, GatewayConfig};
use edge_gateway::lifecycle::{run_gateway, signals::forward_signals};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::Shutdown;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "HTTP edge gateway with a persistent-connection worker pool", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config = override_bind_address(config, bind)?;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        workers = config.pool.workers,
        queue_capacity = config.pool.queue_capacity,
        backend = %config.backend.address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    tokio::spawn(forward_signals(shutdown.clone()));

    run_gateway(&config, listener, HttpConnector::new(&config.backend), shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
