//! Backend connectivity subsystem.
//!
//! # Data Flow
//! ```text
//! Worker receives WorkItem
//!     → connection.rs (PersistentConnection: reuse, detect broken, reconnect once)
//!     → http.rs (HttpConnector / HttpConnection: one keep-alive HTTP/1.1 connection)
//!     → BackendResponse or BackendError back to the worker
//! ```
//!
//! # Design Decisions
//! - Each worker owns exactly one connection; nothing here is shared or locked
//! - Connections are opened lazily on the first request
//! - The transport sits behind the [`Connector`] / [`Connection`] traits so the
//!   pool can be driven by an in-process backend in tests

pub mod connection;
pub mod http;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::body::Bytes;

use crate::error::BackendError;

pub use connection::PersistentConnection;
pub use http::{HttpConnection, HttpConnector};

/// Request forwarded to the backend. Opaque to the pool.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// Path and query, e.g. `/routine/42?verbose=1`.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendRequest {
    /// A body-less GET for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Response returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            body: body.into(),
        }
    }
}

/// Opens outbound connections. Each worker gets its own clone.
#[async_trait]
pub trait Connector: Clone + Send + Sync + 'static {
    type Connection: Connection;

    /// Establish a new connection. Must be bounded in time.
    async fn connect(&self) -> Result<Self::Connection, BackendError>;
}

/// A live connection that executes requests one at a time.
#[async_trait]
pub trait Connection: Send + 'static {
    /// False once the connection is known to be unusable.
    fn is_open(&self) -> bool;

    async fn execute(&mut self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}
