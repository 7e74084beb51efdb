//! Response rendering.
//!
//! # Responsibilities
//! - Relay backend responses (status, content type, body) to the client
//! - Map dispatch and backend errors to HTTP status codes
//!
//! # Design Decisions
//! - Errors render as `{"code": ..., "message": ...}`
//! - Full queue and shutdown are 503 so clients back off
//! - Dispatch timeouts are 504, backend failures 502

use std::any::Any;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::backend::BackendResponse;
use crate::error::{BackendError, DispatchError};

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Build an error response with the standard body.
pub fn error_response(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            code,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Body for a handler that panicked. The panic payload is logged, never sent.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = detail, "Handler panicked");

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error",
    )
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::QueueFull | DispatchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::WorkerLost => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::QueueFull => "QUEUE_FULL",
            DispatchError::Closed => "SHUTTING_DOWN",
            DispatchError::Timeout(_) => "DISPATCH_TIMEOUT",
            DispatchError::WorkerLost => "WORKER_LOST",
            DispatchError::Backend(BackendError::Connection(_)) => "BACKEND_UNAVAILABLE",
            DispatchError::Backend(BackendError::Execution(_)) => "BACKEND_ERROR",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.code(), self.to_string())
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(value) = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}
