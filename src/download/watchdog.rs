//! One-shot deadline timer that cancels an in-flight transfer.
//!
//! The watchdog runs as its own Tokio task and holds only a cancellation
//! token for the transfer. [`WatchdogGuard`] owns the timer: dropping or
//! disarming it aborts the task, so the timer never outlives the fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct WatchdogState {
    fired: AtomicBool,
    finished: AtomicBool,
}

impl WatchdogState {
    /// Claims the cancellation for the deadline unless `target` is already
    /// cancelled.
    ///
    /// `fired` is published before the second look at `target`, so a caller
    /// cancel that lands while the claim is in progress withdraws it.
    fn claim(&self, target: &CancellationToken) -> bool {
        if target.is_cancelled() {
            return false;
        }
        self.fired.store(true, Ordering::SeqCst);
        if target.is_cancelled() {
            self.fired.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }
}

/// Arms deadline timers.
pub struct DeadlineWatchdog;

impl DeadlineWatchdog {
    /// Starts a timer that cancels `target` once `duration` elapses.
    ///
    /// `Duration::MAX` is accepted; tokio clamps it to a far-future instant.
    /// Must be called within a Tokio runtime.
    #[must_use = "dropping the guard disarms the watchdog immediately"]
    pub fn arm(duration: Duration, target: CancellationToken, url: &str) -> WatchdogGuard {
        let state = Arc::new(WatchdogState::default());
        let task_state = Arc::clone(&state);
        let url = url.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            if task_state.finished.load(Ordering::SeqCst) {
                info!(url = %url, "deadline elapsed after transfer finished; nothing to cancel");
                return;
            }
            if !task_state.claim(&target) {
                info!(url = %url, "deadline elapsed after transfer was already cancelled");
                return;
            }

            debug!(
                url = %url,
                timeout_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "deadline elapsed; cancelling transfer"
            );
            target.cancel();
        });

        WatchdogGuard {
            state,
            handle: Some(handle),
        }
    }
}

/// Scoped ownership of an armed deadline timer.
#[derive(Debug)]
pub struct WatchdogGuard {
    state: Arc<WatchdogState>,
    handle: Option<JoinHandle<()>>,
}

impl WatchdogGuard {
    /// Records that the transfer has reached a terminal state.
    ///
    /// A timer firing after this point is a no-op.
    pub fn mark_finished(&self) {
        self.state.finished.store(true, Ordering::SeqCst);
    }

    /// Returns true if the deadline cancelled the transfer.
    #[must_use]
    pub fn fired(&self) -> bool {
        self.state.fired.load(Ordering::SeqCst)
    }

    /// Stops the timer and reports whether it had already fired.
    pub fn disarm(mut self) -> bool {
        self.release();
        self.fired()
    }

    fn release(&mut self) {
        self.mark_finished();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WatchdogGuard {
    fn drop(&mut self) {
        self.release();
    }
}
