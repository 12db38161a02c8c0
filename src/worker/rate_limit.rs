//! Per-stream dispatch pacing.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum gap between dispatches on one stream.
///
/// Each stream owns one limiter, shared across every handler invocation on
/// that stream. [`RateLimiter::throttle`] waits out the remainder of the
/// previous window, then arms the next one. A zero interval disables pacing.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    window_end: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_end: Mutex::new(None),
        }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the interval since the previous pass has elapsed. The
    /// first pass returns immediately.
    pub async fn throttle(&self) {
        if self.interval.is_zero() {
            return;
        }

        let deadline = self.window_end.lock().take();
        if let Some(deadline) = deadline {
            sleep_until(deadline).await;
        }
        *self.window_end.lock() = Some(Instant::now() + self.interval);
    }
}
