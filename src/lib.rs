//! Edge gateway library: a fixed pool of backend workers, each owning one
//! persistent connection, fed by a shared bounded queue.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod resilience;

pub use config::GatewayConfig;
pub use error::{BackendError, DispatchError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pool::{Dispatcher, SharedQueue, WorkerPool};
