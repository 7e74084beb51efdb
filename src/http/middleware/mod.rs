//! Per-route middleware.

pub mod binder;

pub use binder::bind_dispatcher;
