//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Bind listener
//!
//! Run (runner.rs):
//!     Start worker pool → Serve until shutdown → Drain pool
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain HTTP requests
//!     → Close work queue → Workers drain backlog → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: HTTP first, then the pool, so in-flight handlers
//!   still get their results
//! - Pool shutdown has a grace period: stuck workers are aborted after it

pub mod runner;
pub mod shutdown;
pub mod signals;

pub use runner::run_gateway;
pub use shutdown::Shutdown;
