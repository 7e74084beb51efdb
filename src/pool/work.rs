//! Work item and reply protocol between handlers and workers.

use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::time;

use crate::backend::{BackendRequest, BackendResponse};
use crate::error::{BackendError, DispatchError};

/// What a worker sends back for one work item.
pub type WorkResult = Result<BackendResponse, BackendError>;

/// A unit of backend work plus its private return channel.
///
/// Owned by the submitting caller until pushed onto the queue. After that
/// exactly one worker takes it and answers on `reply`.
#[derive(Debug)]
pub struct WorkItem {
    /// Correlation id, usually the inbound `x-request-id`.
    pub id: String,
    pub request: BackendRequest,
    pub reply: oneshot::Sender<WorkResult>,
    pub enqueued_at: Instant,
}

impl WorkItem {
    /// Build a work item and the receiving half of its return channel.
    ///
    /// The oneshot holds one value without a receiver waiting, so the worker's
    /// send never blocks even if the caller already gave up.
    pub fn new(id: impl Into<String>, request: BackendRequest) -> (Self, PendingReply) {
        let id = id.into();
        let (reply, rx) = oneshot::channel();
        let item = Self {
            id: id.clone(),
            request,
            reply,
            enqueued_at: Instant::now(),
        };
        (item, PendingReply { id, rx })
    }

    /// Deliver the result. Returns false if the caller has gone away.
    pub fn complete(self, result: WorkResult) -> bool {
        self.reply.send(result).is_ok()
    }
}

/// Caller side of a submitted work item.
#[derive(Debug)]
pub struct PendingReply {
    id: String,
    rx: oneshot::Receiver<WorkResult>,
}

impl PendingReply {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait up to `timeout` for the worker's result.
    ///
    /// On timeout the receiver is dropped; a later send by the worker is
    /// discarded without error.
    pub async fn wait(self, timeout: Duration) -> Result<BackendResponse, DispatchError> {
        match time::timeout(timeout, self.rx).await {
            Ok(Ok(Ok(response))) => Ok(response),
            Ok(Ok(Err(err))) => Err(DispatchError::Backend(err)),
            Ok(Err(_)) => Err(DispatchError::WorkerLost),
            Err(_) => Err(DispatchError::Timeout(timeout)),
        }
    }
}
