//! Clock Module
//!
//! Wall-clock source used for expiration checks.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;

// == Clock Trait ==
/// Source of the current time as a duration since the Unix epoch.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Duration;

    /// Current time truncated to whole seconds.
    fn now_secs(&self) -> u64 {
        self.now().as_secs()
    }
}

// == System Clock ==
/// Reads UTC wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // Pre-epoch clocks collapse to zero
        let micros = Utc::now().timestamp_micros().max(0) as u64;
        Duration::from_micros(micros)
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use timed_lru::cache::{Clock, ManualClock};
///
/// let clock = ManualClock::new(100);
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now_secs(), 105);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `secs` seconds past the epoch.
    pub fn new(secs: u64) -> Self {
        Self {
            micros: AtomicU64::new(secs.saturating_mul(1_000_000)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        // fetch_add wraps on overflow, so saturate by hand
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(by))
            });
    }

    pub fn set(&self, now: Duration) {
        let micros = u64::try_from(now.as_micros()).unwrap_or(u64::MAX);
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
