//! Shared utilities for integration testing.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use edge_gateway::backend::{BackendRequest, BackendResponse, Connection, Connector};
use edge_gateway::config::GatewayConfig;
use edge_gateway::{BackendError, Dispatcher, HttpServer, SharedQueue, Shutdown, WorkerPool};

/// In-process backend. Echoes the request path as the response body.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    connects: AtomicUsize,
    executions: AtomicUsize,
    generation: AtomicUsize,
    refuse_connects: AtomicBool,
    delay_ms: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every execution sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        let connector = Self::default();
        connector
            .state
            .delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
        connector
    }

    /// Every execution waits for a permit from `gate` before answering.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            state: Arc::new(MockState {
                gate: Some(gate),
                ..MockState::default()
            }),
        }
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.state.executions.load(Ordering::SeqCst)
    }

    /// Mark every connection opened so far as broken.
    pub fn break_connections(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Make subsequent connection attempts fail.
    pub fn refuse_connects(&self, refuse: bool) {
        self.state.refuse_connects.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection, BackendError> {
        if self.state.refuse_connects.load(Ordering::SeqCst) {
            return Err(BackendError::connection("connection refused"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            state: self.state.clone(),
            generation: self.state.generation.load(Ordering::SeqCst),
        })
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
    generation: usize,
}

#[async_trait]
impl Connection for MockConnection {
    fn is_open(&self) -> bool {
        self.generation == self.state.generation.load(Ordering::SeqCst)
    }

    async fn execute(&mut self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        if let Some(gate) = &self.state.gate {
            gate.acquire()
                .await
                .map_err(|_| BackendError::execution("gate closed"))?
                .forget();
        }

        let delay = self.state.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        self.state.executions.fetch_add(1, Ordering::SeqCst);
        Ok(BackendResponse::ok(request.path.clone()))
    }
}

/// Real HTTP/1.1 backend on an ephemeral port.
#[allow(dead_code)]
pub struct MockBackend {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockBackend {
    /// TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Start a backend answering `routine:<path-and-query>` as plain text.
///
/// With `keep_alive` off, the backend closes every connection after one response.
#[allow(dead_code)]
pub async fn start_mock_backend(keep_alive: bool) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(AtomicUsize::new(0));

    let accepted = connections.clone();
    let served = requests.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let served = served.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    served.fetch_add(1, Ordering::SeqCst);
                    let target = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.as_str().to_owned())
                        .unwrap_or_default();
                    async move {
                        Ok::<_, Infallible>(
                            Response::builder()
                                .header(header::CONTENT_TYPE, "text/plain")
                                .body(Body::from(format!("routine:{target}")))
                                .unwrap(),
                        )
                    }
                });

                let _ = http1::Builder::new()
                    .keep_alive(keep_alive)
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    MockBackend {
        addr,
        connections,
        requests,
    }
}

/// An address nothing listens on.
#[allow(dead_code)]
pub fn unused_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running gateway bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    server: tokio::task::JoinHandle<()>,
    pool: WorkerPool,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop the server, then drain the pool.
    pub async fn stop(self) {
        self.shutdown.trigger("test teardown");
        let _ = self.server.await;
        self.pool.shutdown(Duration::from_secs(5)).await;
    }
}

/// Start the full gateway against a real HTTP backend at `backend`.
#[allow(dead_code)]
pub async fn start_gateway(backend: SocketAddr, workers: usize) -> TestGateway {
    let mut config = GatewayConfig::default();
    config.backend.address = backend.to_string();
    config.backend.connect_timeout_ms = 500;
    config.pool.workers = workers;

    let queue = SharedQueue::new(config.pool.queue_capacity);
    let pool = WorkerPool::start(
        workers,
        edge_gateway::backend::HttpConnector::new(&config.backend),
        queue.clone(),
        Duration::from_millis(config.backend.reconnect_delay_ms),
    );
    let dispatcher = Dispatcher::new(queue, &config.dispatch);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.clone();
    let server = HttpServer::new(&config, dispatcher);
    let server = tokio::spawn(async move {
        server.run(listener, stop).await.unwrap();
    });

    TestGateway {
        addr,
        shutdown,
        server,
        pool,
    }
}
