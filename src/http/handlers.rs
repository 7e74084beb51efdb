//! HTTP handlers that reach the worker pool.

use std::time::Instant;

use axum::{
    extract::{Path, RawQuery},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::backend::BackendRequest;
use crate::http::request::{RequestIdExt, X_REQUEST_ID};
use crate::http::response::error_response;
use crate::observability::metrics;
use crate::pool::Dispatcher;

/// `GET /chans/routine/{id}`: forward to the backend's `/routine/{id}`.
pub async fn invoke_routine(
    Extension(dispatcher): Extension<Dispatcher>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();

    if !is_valid_routine_id(&id) {
        tracing::debug!(routine = %id, "Rejected malformed routine id");
        let response = error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_ROUTINE_ID",
            "Routine id may only contain letters, digits, '-', '_', '.' and '~'",
        );
        metrics::record_request(Method::GET.as_str(), response.status().as_u16(), start);
        return response;
    }

    let request_id = headers
        .request_id()
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut path = format!("/routine/{id}");
    if let Some(query) = query {
        path.push('?');
        path.push_str(&query);
    }

    let mut request = BackendRequest::get(path);
    if let Some(value) = headers.get(X_REQUEST_ID) {
        request.headers.insert(X_REQUEST_ID, value.clone());
    }

    tracing::debug!(request_id = %request_id, routine = %id, "Dispatching routine call");

    let response = match dispatcher.dispatch(request_id.as_str(), request).await {
        Ok(backend) => backend.into_response(),
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Routine call failed");
            err.into_response()
        }
    };

    metrics::record_request(Method::GET.as_str(), response.status().as_u16(), start);
    response
}

/// Ids become a single backend path segment. `Path` has already
/// percent-decoded them, so only unreserved characters are let through and
/// dot segments are refused.
fn is_valid_routine_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub workers: usize,
    pub queue_capacity: usize,
    pub queue_depth: usize,
}

/// `GET /healthcheck`: gateway liveness plus queue occupancy.
pub async fn health_check(
    Extension(dispatcher): Extension<Dispatcher>,
    Extension(workers): Extension<PoolSize>,
) -> Response {
    let queue = dispatcher.queue();
    let status = if queue.is_closed() { "shutting_down" } else { "ok" };
    Json(HealthStatus {
        status,
        workers: workers.0,
        queue_capacity: queue.capacity(),
        queue_depth: queue.depth(),
    })
    .into_response()
}

/// Number of workers, attached alongside the dispatcher for reporting.
#[derive(Debug, Clone, Copy)]
pub struct PoolSize(pub usize);

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "PAGE_NOT_FOUND", "Page not found")
}
