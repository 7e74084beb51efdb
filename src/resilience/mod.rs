//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend call fails with a connection-level error:
//!     → backoff.rs (short jittered pause)
//!     → one retry on a fresh connection (backend::connection)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external wait has a deadline
//! - Only connection-level failures are retried, and only once per request
//! - Jitter keeps workers from reconnecting in lockstep

pub mod backoff;
