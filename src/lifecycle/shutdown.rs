//! Gateway-wide stop flag.
//!
//! The flag is level-triggered: anything that starts waiting after the
//! trigger (a late HTTP server start, a test harness) still sees it.

use std::sync::Arc;

use tokio::sync::watch;

/// Stop flag shared by the signal listener, the HTTP server and tests.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
        }
    }

    /// Raise the flag. Only the first call logs.
    pub fn trigger(&self, reason: &'static str) {
        if !self.tx.send_replace(true) {
            tracing::info!(reason, "Gateway shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the flag is raised, immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // `self` holds the sender, so this cannot fail.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
