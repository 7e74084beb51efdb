//! Fixed-size worker pool.
//!
//! Starts N workers on a shared queue and owns their task handles so the pool
//! can be shut down deterministically.

use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time;

use crate::backend::{Connector, PersistentConnection};
use crate::pool::queue::SharedQueue;
use crate::pool::worker::Worker;

/// N workers reading one shared queue (competing consumers).
pub struct WorkerPool {
    queue: SharedQueue,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers, each with its own lazily opened connection.
    ///
    /// Worker indices are for diagnostics only; routing is first-idle-first-served.
    pub fn start<C: Connector>(size: usize, connector: C, queue: SharedQueue, reconnect_delay: Duration) -> Self {
        let workers = (0..size)
            .map(|index| {
                let connection = PersistentConnection::new(connector.clone(), index, reconnect_delay);
                let worker = Worker::new(index, connection, queue.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::info!(
            workers = size,
            queue_capacity = queue.capacity(),
            "Worker pool started"
        );

        Self { queue, workers }
    }

    /// The only handle the rest of the system gets.
    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait up to `grace` for workers to drain it.
    ///
    /// Workers still busy after the grace period are aborted.
    pub async fn shutdown(self, grace: Duration) {
        self.queue.close();

        let aborts: Vec<_> = self.workers.iter().map(JoinHandle::abort_handle).collect();
        match time::timeout(grace, join_all(self.workers)).await {
            Ok(results) => {
                for (index, result) in results.into_iter().enumerate() {
                    if let Err(e) = result {
                        tracing::error!(worker = index, error = %e, "Worker task failed");
                    }
                }
                tracing::info!("Worker pool shutdown complete");
            }
            Err(_) => {
                tracing::warn!(grace = ?grace, "Workers did not drain in time, aborting");
                for abort in aborts {
                    abort.abort();
                }
            }
        }
    }
}
