//! Error taxonomy shared by the worker pool and the HTTP layer.
//!
//! Two levels exist:
//! - [`BackendError`] travels inside a worker's result. It describes what went
//!   wrong talking to the backend.
//! - [`DispatchError`] is what a caller of the dispatcher sees. Queue-level
//!   failures (full, closed, timed out) live here, and backend failures are
//!   wrapped unchanged.

use std::time::Duration;

/// Failure produced by a worker while executing a work item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The persistent connection failed and could not be re-established.
    #[error("backend connection failed: {0}")]
    Connection(String),

    /// The backend call itself failed.
    #[error("backend execution failed: {0}")]
    Execution(String),
}

impl BackendError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Connection-level errors are the only ones a worker retries.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Failure returned to a caller of [`crate::pool::Dispatcher`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The shared queue stayed full for the whole submission timeout.
    #[error("dispatch queue is full")]
    QueueFull,

    /// No result arrived in time. The work item is abandoned, not cancelled.
    #[error("no reply from worker within {0:?}")]
    Timeout(Duration),

    /// The queue has been closed for shutdown.
    #[error("dispatch queue is closed")]
    Closed,

    /// The worker dropped the return channel without sending a result.
    #[error("worker dropped the request without replying")]
    WorkerLost,

    /// The worker replied with a backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DispatchError {
    /// Short label used for metrics and log fields.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::QueueFull => "queue_full",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Closed => "closed",
            DispatchError::WorkerLost => "worker_lost",
            DispatchError::Backend(BackendError::Connection(_)) => "connection_error",
            DispatchError::Backend(BackendError::Execution(_)) => "backend_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_are_retryable() {
        assert!(BackendError::connection("reset").is_connection());
        assert!(!BackendError::execution("bad gateway").is_connection());
    }

    #[test]
    fn backend_errors_pass_through_dispatch_error() {
        let err: DispatchError = BackendError::execution("boom").into();
        assert_eq!(err.to_string(), "backend execution failed: boom");
        assert_eq!(err.outcome(), "backend_error");
    }

    #[test]
    fn timeout_message_includes_duration() {
        let err = DispatchError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
