//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic recovery, timeout, CORS)
//! - Bind the dispatcher to the routes that reach the worker pool
//! - Serve until the shutdown signal fires

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Extension, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{CorsConfig, GatewayConfig};
use crate::http::handlers::{health_check, invoke_routine, not_found, PoolSize};
use crate::http::middleware::bind_dispatcher;
use crate::http::response::panic_response;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::pool::Dispatcher;

/// HTTP front of the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server around an already started pool's dispatcher.
    pub fn new(config: &GatewayConfig, dispatcher: Dispatcher) -> Self {
        let router = Self::build_router(config, dispatcher);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, dispatcher: Dispatcher) -> Router {
        let pool_routes = Router::new()
            .route("/chans/routine/{id}", get(invoke_routine))
            .route("/healthcheck", get(health_check))
            .layer(Extension(PoolSize(config.pool.workers)))
            .route_layer(middleware::from_fn_with_state(dispatcher, bind_dispatcher));

        Router::new()
            .merge(pool_routes)
            .fallback(not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(CatchPanicLayer::custom(panic_response))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(cors_layer(&config.cors)),
            )
    }

    /// Consume the server and return the router, for in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received, draining HTTP connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// CORS policy for browser clients. Origins are validated at config load.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::PATCH,
            Method::POST,
            Method::HEAD,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-xsrf-token"),
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::AUTHORIZATION,
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            X_REQUEST_ID,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}
