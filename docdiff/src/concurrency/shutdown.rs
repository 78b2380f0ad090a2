//! Shared cancellation signal for every worker of a diff run.
//!
//! A single [`ShutdownTx`] is owned by the pipeline driver and every worker holds a
//! [`ShutdownRx`] subscribed to it. Once shutdown is requested it cannot be revoked.

use tokio::sync::watch;

/// Sending side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

impl ShutdownTx {
    /// Requests shutdown of every subscribed worker.
    ///
    /// Requesting shutdown more than once has no additional effect.
    pub fn shutdown(&self) {
        self.0.send_if_modified(|shutdown| {
            if *shutdown {
                return false;
            }

            *shutdown = true;
            true
        });
    }

    /// Returns `true` if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new receiver observing this signal.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiving side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns `true` if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until shutdown is requested.
    ///
    /// Resolves immediately if shutdown was already requested. If every [`ShutdownTx`] is
    /// dropped without requesting shutdown, the returned future never resolves.
    pub async fn wait_for_shutdown(&mut self) {
        if self.0.wait_for(|shutdown| *shutdown).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a new shutdown channel in the "running" state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}
