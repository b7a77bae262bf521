//! Stop signal shared by the server loop and the window sweeper.

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_signal;

/// One-shot stop broadcast.
///
/// `HttpServer::run` takes a receiver for connection draining and hands a
/// resubscribed copy to the rate-limit sweeper.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Broadcast the stop; returns how many tasks were told to drain.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Wait for Ctrl+C or SIGTERM, then stop every subscriber.
    pub async fn trigger_on_signal(self) {
        wait_for_signal().await;
        let draining = self.trigger();
        tracing::info!(draining, "Graceful shutdown started");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
