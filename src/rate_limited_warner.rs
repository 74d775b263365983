//! Rate-limited warnings for dropped and failed envelopes.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default interval between warnings about the same kind of loss.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

pub type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(saturating_millis)
        .unwrap_or(0)
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Helper that rate limits loss warnings.
///
/// The caller increments the counter via [`record_drop`](Self::record_drop).
/// The next call to [`warn_if_due`](Self::warn_if_due) invokes the provided
/// callback with the accumulated count if the interval has elapsed.
/// [`flush`](Self::flush) reports immediately.
pub struct RateLimitedWarner {
    last_warn: AtomicU64,
    dropped: AtomicU64,
    interval_ms: u64,
    clock: Clock,
}

impl RateLimitedWarner {
    /// Create a warner whose first warning can be emitted immediately.
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Box::new(system_clock))
    }

    pub fn with_clock(interval: Duration, clock: Clock) -> Self {
        let interval_ms = saturating_millis(interval);
        Self {
            last_warn: AtomicU64::new(clock().saturating_sub(interval_ms)),
            dropped: AtomicU64::new(0),
            interval_ms,
            clock,
        }
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of losses recorded since the last emitted warning.
    pub fn pending(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = (self.clock)();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if now.saturating_sub(prev) < self.interval_ms {
            return;
        }
        // Only one thread wins the interval.
        if self
            .last_warn
            .compare_exchange(prev, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
        }
    }

    pub fn flush(&self, mut warn: impl FnMut(u64)) {
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store((self.clock)(), Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for RateLimitedWarner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedWarner")
            .field("dropped", &self.pending())
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}
