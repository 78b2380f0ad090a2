use std::time::Duration;
use std::{fmt, sync::Arc};

use tokio::sync::Notify;
use tokio::time::timeout;

/// Default timeout duration for notifications.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// A shared [`Notify`] whose waits fail the test instead of hanging it.
#[derive(Clone)]
pub struct TimedNotify {
    notify: Arc<Notify>,
    timeout_duration: Duration,
}

impl TimedNotify {
    /// Creates a new [`TimedNotify`] with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_NOTIFY_TIMEOUT)
    }

    pub fn with_timeout(timeout_duration: Duration) -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            timeout_duration,
        }
    }

    /// Stores a notification for the next waiter.
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Waits for a notification.
    ///
    /// # Panics
    ///
    /// Panics if the timeout elapses before a notification is received.
    pub async fn notified(&self) {
        if timeout(self.timeout_duration, self.notify.notified())
            .await
            .is_err()
        {
            panic!(
                "test notification timed out after {:?}, the awaited point was never reached",
                self.timeout_duration
            );
        }
    }
}

impl Default for TimedNotify {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimedNotify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedNotify")
            .field("timeout_duration", &self.timeout_duration)
            .finish()
    }
}
