use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source plus the blocking sleep the run loop uses.
///
/// Timestamps are offsets from an arbitrary origin fixed at construction.
pub trait Timer {
    fn now(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);
}

/// Wall clock: `Instant` for time, `thread::sleep` for waiting.
#[derive(Debug, Clone)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    slept: Duration,
    sleeps: u64,
}

/// Virtual clock for tests. Sleeping advances time instantly.
///
/// Clones share the same clock, so a test can keep a handle while the
/// window owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward without counting it as sleep.
    pub fn advance(&self, by: Duration) {
        self.state.lock().now += by;
    }

    /// Total time spent in `sleep`.
    pub fn total_slept(&self) -> Duration {
        self.state.lock().slept
    }

    /// Number of `sleep` calls.
    pub fn sleeps(&self) -> u64 {
        self.state.lock().sleeps
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn sleep(&mut self, duration: Duration) {
        let mut s = self.state.lock();
        s.now += duration;
        s.slept += duration;
        s.sleeps += 1;
    }
}
