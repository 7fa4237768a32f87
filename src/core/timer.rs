//! Time sources and the timeout gate.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for timers.
///
/// Machines hold an `Arc<dyn Clock>` so tests and replays can drive time by
/// hand instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same offset, so a test can keep one handle and give
/// another to the machine.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn set_elapsed(&self, elapsed: Duration) {
        *self.offset.lock() = elapsed;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

/// Pure timeout primitive: a start instant plus a duration.
///
/// All queries take `now` explicitly; the gate never reads a clock itself.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use turnstack::core::TimerGate;
///
/// let start = Instant::now();
/// let gate = TimerGate::new(start, Duration::from_secs(5));
///
/// assert!(!gate.is_expired(start + Duration::from_secs(4)));
/// assert!(gate.is_expired(start + Duration::from_secs(5)));
/// assert_eq!(gate.remaining(start + Duration::from_secs(2)), Duration::from_secs(3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerGate {
    started_at: Instant,
    duration: Duration,
}

impl TimerGate {
    pub fn new(started_at: Instant, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time since the gate started; zero if `now` precedes the start.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    /// Expired once `now - started_at >= duration`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }
}
