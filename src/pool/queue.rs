//! Bounded multi-producer / multi-consumer work queue.
//!
//! # Responsibilities
//! - Accept work items from any number of handlers (bounded, fail-fast)
//! - Hand each item to exactly one of the competing workers
//! - Close for shutdown: reject new items, let workers drain the backlog
//!
//! # Design Decisions
//! - Tokio `mpsc` gives the bounded buffer; its single receiver is shared
//!   behind an async mutex, so idle workers queue up in FIFO order
//! - Closing is signalled through a `watch` flag, independent of how many
//!   sender clones are still alive in handlers

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time;

use crate::error::DispatchError;
use crate::pool::work::WorkItem;

/// Shared handle to the work queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SharedQueue {
    tx: mpsc::Sender<WorkItem>,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl SharedQueue {
    /// Create a queue holding at most `capacity` pending items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; configuration validation rejects that.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let (closed, _) = watch::channel(false);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            closed: Arc::new(closed),
        }
    }

    /// Maximum number of pending items.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Items currently waiting for a worker.
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Stop accepting items. Already queued items are still handed out.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            tracing::info!(pending = self.depth(), "Work queue closed");
        }
    }

    /// Enqueue `item`, waiting at most `wait` for space.
    ///
    /// A zero `wait` fails immediately when the queue is full.
    pub async fn push(&self, item: WorkItem, wait: Duration) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::Closed);
        }

        if wait.is_zero() {
            return self.tx.try_send(item).map_err(|e| match e {
                TrySendError::Full(_) => DispatchError::QueueFull,
                TrySendError::Closed(_) => DispatchError::Closed,
            });
        }

        match time::timeout(wait, self.tx.send(item)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DispatchError::Closed),
            Err(_) => Err(DispatchError::QueueFull),
        }
    }

    /// Take the next item, suspending until one arrives.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<WorkItem> {
        let mut rx = self.rx.lock().await;

        if self.is_closed() {
            rx.close();
            return rx.recv().await;
        }

        tokio::select! {
            biased;
            item = rx.recv() => item,
            () = self.wait_closed() => {
                rx.close();
                rx.recv().await
            }
        }
    }

    async fn wait_closed(&self) {
        let mut closed = self.closed.subscribe();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendRequest;

    fn item(id: &str) -> WorkItem {
        WorkItem::new(id, BackendRequest::get("/")).0
    }

    #[tokio::test]
    async fn items_come_out_in_order() {
        let queue = SharedQueue::new(4);
        queue.push(item("a"), Duration::ZERO).await.unwrap();
        queue.push(item("b"), Duration::ZERO).await.unwrap();
        assert_eq!(queue.depth(), 2);

        assert_eq!(queue.next().await.unwrap().id, "a");
        assert_eq!(queue.next().await.unwrap().id, "b");
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn full_queue_fails_fast() {
        let queue = SharedQueue::new(1);
        queue.push(item("a"), Duration::ZERO).await.unwrap();

        let err = queue.push(item("b"), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, DispatchError::QueueFull));

        let err = queue.push(item("c"), Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, DispatchError::QueueFull));
    }

    #[tokio::test]
    async fn waiting_push_succeeds_when_space_frees() {
        let queue = SharedQueue::new(1);
        queue.push(item("a"), Duration::ZERO).await.unwrap();

        let consumer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            consumer.next().await
        });

        queue.push(item("b"), Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn close_rejects_new_items_and_drains_backlog() {
        let queue = SharedQueue::new(4);
        queue.push(item("a"), Duration::ZERO).await.unwrap();
        queue.push(item("b"), Duration::ZERO).await.unwrap();
        queue.close();

        let err = queue.push(item("c"), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, DispatchError::Closed));

        assert_eq!(queue.next().await.unwrap().id, "a");
        assert_eq!(queue.next().await.unwrap().id, "b");
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn close_wakes_idle_consumer() {
        let queue = SharedQueue::new(1);
        let consumer = queue.clone();
        let waiter = tokio::spawn(async move { consumer.next().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let next = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("consumer should wake up")
            .unwrap();
        assert!(next.is_none());
    }
}
