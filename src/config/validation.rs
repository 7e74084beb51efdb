//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes >= 1, timeouts > 0, addresses parse)
//! - Check that dispatch waits fit inside the HTTP request timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("backend.address must be host:port, got {0:?}")]
    BadBackend(String),

    #[error(
        "dispatch.submit_timeout_ms + dispatch.response_timeout_ms ({total_ms}ms) exceeds timeouts.request_secs ({request_secs}s)"
    )]
    DispatchExceedsRequest { total_ms: u64, request_secs: u64 },

    #[error("cors.allowed_origins contains an invalid origin: {0:?}")]
    BadOrigin(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let non_zero: [(&'static str, u64); 6] = [
        ("pool.workers", config.pool.workers as u64),
        ("pool.queue_capacity", config.pool.queue_capacity as u64),
        ("dispatch.response_timeout_ms", config.dispatch.response_timeout_ms),
        ("backend.connect_timeout_ms", config.backend.connect_timeout_ms),
        ("backend.request_timeout_ms", config.backend.request_timeout_ms),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if !is_host_port(&config.backend.address) {
        errors.push(ValidationError::BadBackend(config.backend.address.clone()));
    }

    let total_ms = config
        .dispatch
        .submit_timeout_ms
        .saturating_add(config.dispatch.response_timeout_ms);
    if config.timeouts.request_secs > 0 && total_ms > config.timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::DispatchExceedsRequest {
            total_ms,
            request_secs: config.timeouts.request_secs,
        });
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::BadOrigin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p > 0),
        None => false,
    }
}
