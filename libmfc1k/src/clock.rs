// libmfc1k/src/clock.rs

//! Monotonic time source used by the session tracker and the polling loops.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Time source of the polling loops.
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block (or pretend to) for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant::now` and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Test clock that only moves when told to. `sleep` advances it instantly.
/// Clones share the same time line.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Clock frozen at creation time.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
