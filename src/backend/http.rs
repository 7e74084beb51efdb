//! HTTP/1.1 backend transport.
//!
//! Each [`HttpConnection`] is a single keep-alive connection driven by hyper's
//! low-level client (`hyper::client::conn::http1`). There is no client-side
//! pool: the worker owning the connection is the only one sending on it.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::time;

use crate::backend::{BackendRequest, BackendResponse, Connection, Connector};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Dials the configured backend and performs the HTTP/1.1 handshake.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    address: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    max_response_bytes: usize,
}

impl HttpConnector {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            address: config.address.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_response_bytes: config.max_response_bytes,
        }
    }

    /// Backend `host:port`.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Connection = HttpConnection;

    async fn connect(&self) -> Result<HttpConnection, BackendError> {
        let stream = time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                BackendError::connection(format!(
                    "connect to {} timed out after {:?}",
                    self.address, self.connect_timeout
                ))
            })?
            .map_err(|e| BackendError::connection(format!("connect to {}: {e}", self.address)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| BackendError::connection(format!("set TCP_NODELAY: {e}")))?;

        let (sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| BackendError::connection(format!("HTTP handshake with {}: {e}", self.address)))?;

        // Drive the connection in the background; it ends when the sender is dropped.
        let address = self.address.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(backend = %address, error = %e, "Backend connection closed");
            }
        });

        let host = HeaderValue::from_str(&self.address)
            .map_err(|e| BackendError::connection(format!("invalid backend address {}: {e}", self.address)))?;

        Ok(HttpConnection {
            sender,
            host,
            request_timeout: self.request_timeout,
            max_response_bytes: self.max_response_bytes,
            poisoned: false,
        })
    }
}

/// One persistent HTTP/1.1 connection to the backend.
pub struct HttpConnection {
    sender: SendRequest<Body>,
    host: HeaderValue,
    request_timeout: Duration,
    max_response_bytes: usize,
    /// Set when an exchange was interrupted and the stream state is unknown.
    poisoned: bool,
}

impl HttpConnection {
    fn build_request(&self, request: &BackendRequest) -> Result<Request<Body>, BackendError> {
        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(request.path.as_str());

        if let Some(headers) = builder.headers_mut() {
            for (name, value) in request.headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
            headers.insert(header::HOST, self.host.clone());
        }

        builder
            .body(Body::from(request.body.clone()))
            .map_err(|e| BackendError::execution(format!("invalid backend request: {e}")))
    }
}

#[async_trait]
impl Connection for HttpConnection {
    fn is_open(&self) -> bool {
        !self.poisoned && !self.sender.is_closed()
    }

    async fn execute(&mut self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        // Nothing has been written yet, so a failure here is always safe to retry.
        self.sender
            .ready()
            .await
            .map_err(|e| BackendError::connection(format!("connection not ready: {e}")))?;

        let outgoing = self.build_request(request)?;
        let idempotent = request.method.is_idempotent();
        let limit = self.max_response_bytes;
        let sender = &mut self.sender;

        let exchange = async move {
            let response = sender.send_request(outgoing).await.map_err(|e| {
                // A non-idempotent request may already have reached the backend.
                if idempotent {
                    BackendError::connection(format!("send request: {e}"))
                } else {
                    BackendError::execution(format!("send request: {e}"))
                }
            })?;

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), limit)
                .await
                .map_err(|e| BackendError::execution(format!("read response body: {e}")))?;

            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            Ok::<_, BackendError>(BackendResponse {
                status: parts.status,
                content_type,
                body,
            })
        };

        let result = match time::timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::execution(format!(
                "backend did not answer within {:?}",
                self.request_timeout
            ))),
        };

        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}
