use tracing::Instrument;

use crate::backend::{Connector, PersistentConnection};
use crate::observability::metrics;
use crate::pool::queue::SharedQueue;
use crate::pool::work::WorkItem;

/// A long-lived executor owning one persistent backend connection.
///
/// Workers compete for items on the shared queue and process them strictly one
/// at a time, which is what makes reusing a single connection safe.
pub struct Worker<C: Connector> {
    index: usize,
    connection: PersistentConnection<C>,
    queue: SharedQueue,
}

impl<C: Connector> Worker<C> {
    pub fn new(index: usize, connection: PersistentConnection<C>, queue: SharedQueue) -> Self {
        Self {
            index,
            connection,
            queue,
        }
    }

    /// Drain the queue until it is closed and empty.
    pub async fn run(mut self) {
        tracing::debug!(worker = self.index, "Worker started");

        while let Some(item) = self.queue.next().await {
            metrics::record_queue_depth(self.queue.depth());
            self.process(item).await;
        }

        tracing::debug!(worker = self.index, "Worker stopped");
    }

    async fn process(&mut self, item: WorkItem) {
        let span = tracing::debug_span!("work_item", worker = self.index, request_id = %item.id);

        async {
            tracing::trace!(
                queued_ms = item.enqueued_at.elapsed().as_millis() as u64,
                path = %item.request.path,
                "Executing work item"
            );

            let result = self.connection.execute(&item.request).await;
            if let Err(err) = &result {
                tracing::warn!(error = %err, "Backend call failed");
            }

            if !item.complete(result) {
                tracing::debug!("Caller abandoned the request, result discarded");
                metrics::record_abandoned_reply();
            }
        }
        .instrument(span)
        .await
    }
}
