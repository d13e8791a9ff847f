//! Shutdown coordination for the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Carries the drain timeout alongside the trigger, so every waiter learns
/// both that shutdown began and how long it may take. Late subscribers still
/// observe a trigger that already happened.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<Duration>>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown, bounded by `timeout`. Later triggers are ignored.
    pub fn trigger(&self, timeout: Duration) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(timeout);
            true
        });
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Wait for a shutdown request and return its timeout.
    pub async fn requested(&self) -> Duration {
        let mut rx = self.tx.subscribe();
        let timeout = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .map(|timeout| (*timeout).unwrap_or_default());

        match timeout {
            Some(timeout) => timeout,
            // The sender lives as long as `self`, so this never resolves.
            None => std::future::pending().await,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
