//! Persistent connection handle owned by a single worker.
//!
//! # Responsibilities
//! - Open the backend connection lazily on first use
//! - Reuse it across requests while it stays open
//! - Reconnect when it is found broken, at most once per request
//!
//! # Design Decisions
//! - The handle is an `Option` owned by the worker: no pool, no locking
//! - A failed reconnect is surfaced as [`BackendError::Connection`]

use std::time::Duration;

use crate::backend::{BackendRequest, BackendResponse, Connection, Connector};
use crate::error::BackendError;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// A lazily established, reusable backend connection.
pub struct PersistentConnection<C: Connector> {
    connector: C,
    conn: Option<C::Connection>,
    worker: usize,
    reconnect_delay: Duration,
}

impl<C: Connector> PersistentConnection<C> {
    /// Create an unconnected handle. Nothing is dialed until the first request.
    pub fn new(connector: C, worker: usize, reconnect_delay: Duration) -> Self {
        Self {
            connector,
            conn: None,
            worker,
            reconnect_delay,
        }
    }

    /// True when a connection exists and still reports itself open.
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| c.is_open())
    }

    /// Execute `request`, reconnecting once if the connection is broken.
    pub async fn execute(&mut self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let mut reconnected = false;

        loop {
            if self.conn.as_ref().is_some_and(|c| !c.is_open()) {
                tracing::debug!(worker = self.worker, "Backend connection found closed, reconnecting");
                self.conn = None;
                reconnected = true;
                metrics::record_reconnect(self.worker);
            }

            let conn = match self.conn.take() {
                Some(conn) => conn,
                None => {
                    let conn = self.connector.connect().await?;
                    tracing::debug!(worker = self.worker, "Backend connection established");
                    conn
                }
            };
            let conn = self.conn.insert(conn);

            match conn.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_connection() && !reconnected => {
                    tracing::warn!(
                        worker = self.worker,
                        error = %err,
                        "Backend connection failed, retrying on a fresh connection"
                    );
                    self.conn = None;
                    reconnected = true;
                    metrics::record_reconnect(self.worker);
                    let base_ms = self.reconnect_delay.as_millis() as u64;
                    tokio::time::sleep(calculate_backoff(1, base_ms, base_ms)).await;
                }
                Err(err) => {
                    if err.is_connection() {
                        self.conn = None;
                    }
                    return Err(err);
                }
            }
        }
    }
}
