//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → sections handed to the pool, dispatcher and HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pool size cannot change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, override_bind_address, parse_config, ConfigError};
pub use schema::{
    BackendConfig, CorsConfig, DispatchConfig, GatewayConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PoolConfig, TimeoutConfig,
};
