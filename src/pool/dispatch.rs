//! Dispatch gateway: submit a request to the pool and wait for its result.
//!
//! # Responsibilities
//! - Wrap each request in a work item with a fresh return channel
//! - Bound the wait for queue space (submission timeout)
//! - Bound the wait for the result (response timeout)
//!
//! # Design Decisions
//! - Full queue fails fast with `QueueFull` once the submission timeout expires
//! - The response timeout starts after the item is enqueued
//! - Timing out abandons the item; the worker is never interrupted

use std::time::{Duration, Instant};

use crate::backend::{BackendRequest, BackendResponse};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::observability::metrics;
use crate::pool::queue::SharedQueue;
use crate::pool::work::{PendingReply, WorkItem};

/// Handle given to request handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: SharedQueue,
    submit_timeout: Duration,
    response_timeout: Duration,
}

impl Dispatcher {
    pub fn new(queue: SharedQueue, config: &DispatchConfig) -> Self {
        Self {
            queue,
            submit_timeout: Duration::from_millis(config.submit_timeout_ms),
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        }
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Enqueue `request` without waiting for the result.
    pub async fn submit(&self, id: impl Into<String>, request: BackendRequest) -> Result<PendingReply, DispatchError> {
        let (item, pending) = WorkItem::new(id, request);
        self.queue.push(item, self.submit_timeout).await?;
        metrics::record_queue_depth(self.queue.depth());
        Ok(pending)
    }

    /// Submit and wait using the configured response timeout.
    pub async fn dispatch(&self, id: impl Into<String>, request: BackendRequest) -> Result<BackendResponse, DispatchError> {
        self.dispatch_with_timeout(id, request, self.response_timeout).await
    }

    /// Submit and wait at most `timeout` for the result.
    pub async fn dispatch_with_timeout(
        &self,
        id: impl Into<String>,
        request: BackendRequest,
        timeout: Duration,
    ) -> Result<BackendResponse, DispatchError> {
        let started = Instant::now();
        let result = match self.submit(id, request).await {
            Ok(pending) => {
                let id = pending.id().to_owned();
                let result = pending.wait(timeout).await;
                if let Err(DispatchError::Timeout(_)) = &result {
                    tracing::warn!(request_id = %id, timeout = ?timeout, "Dispatch timed out, abandoning work item");
                }
                result
            }
            Err(err) => {
                tracing::warn!(error = %err, depth = self.queue.depth(), "Dispatch rejected");
                Err(err)
            }
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.outcome(),
        };
        metrics::record_dispatch(outcome, started);
        result
    }
}
