//! Cancellable logout watchdog.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// One-shot timer running `on_fire` after a delay unless cancelled first.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct LogoutTimer {
    handle: JoinHandle<()>,
}

impl LogoutTimer {
    /// Spawn the timer on the current tokio runtime.
    pub fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        trace!(?delay, "Arming logout timer");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self { handle }
    }

    /// Cancel the timer. Idempotent: a timer that already fired is left alone.
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LogoutTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
