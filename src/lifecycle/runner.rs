//! Serve-then-drain sequence shared by the binary and integration tests.

use std::time::Duration;

use tokio::net::TcpListener;

use crate::backend::Connector;
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::pool::{Dispatcher, SharedQueue, WorkerPool};

/// Start the pool, serve HTTP on `listener` until `shutdown` fires, then
/// drain the pool.
///
/// The pool is drained whether or not the server exited cleanly; a server
/// error is returned afterwards.
pub async fn run_gateway<C: Connector>(
    config: &GatewayConfig,
    listener: TcpListener,
    connector: C,
    shutdown: Shutdown,
) -> std::io::Result<()> {
    let queue = SharedQueue::new(config.pool.queue_capacity);
    let pool = WorkerPool::start(
        config.pool.workers,
        connector,
        queue.clone(),
        Duration::from_millis(config.backend.reconnect_delay_ms),
    );
    let dispatcher = Dispatcher::new(queue, &config.dispatch);

    let served = HttpServer::new(config, dispatcher).run(listener, shutdown).await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server failed, draining worker pool");
    }

    pool.shutdown(Duration::from_secs(config.pool.shutdown_grace_secs)).await;
    served
}
