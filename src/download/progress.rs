//! Progress fraction computation and throttling.

use std::time::{Duration, Instant};

use super::request::ProgressCallback;

/// Computes `received / total`, clamped to `[0.0, 1.0]`.
///
/// Returns `None` when the total is unknown or zero, so callers never see a
/// NaN or infinite fraction.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fraction(received: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some((received as f64 / total as f64).clamp(0.0, 1.0)),
        _ => None,
    }
}

/// Rate-limiter for progress updates.
///
/// Ensures progress events are not emitted more frequently than the
/// configured interval. A zero interval never throttles.
#[derive(Debug)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Check if enough time has passed to emit another progress update.
    pub fn should_emit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

/// Forwards byte counts to a [`ProgressCallback`] as monotonic fractions.
///
/// Fractions never decrease, duplicates are dropped, and completion (`1.0`)
/// bypasses the throttle so the caller always sees the end.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    throttle: ProgressThrottle,
    last_emitted: Option<f64>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(callback: Option<ProgressCallback>, min_interval: Duration) -> Self {
        Self {
            callback,
            throttle: ProgressThrottle::new(min_interval),
            last_emitted: None,
        }
    }

    /// Reports `received` bytes out of an optional `total`.
    pub fn report(&mut self, received: u64, total: Option<u64>) {
        let Some(callback) = self.callback.as_ref() else {
            return;
        };
        let Some(current) = fraction(received, total) else {
            return;
        };

        let current = self.last_emitted.map_or(current, |last| current.max(last));
        if self.last_emitted.is_some_and(|last| current <= last) {
            return;
        }
        if current < 1.0 && !self.throttle.should_emit() {
            return;
        }

        self.last_emitted = Some(current);
        callback(current);
    }
}
