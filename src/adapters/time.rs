//! Clock adapters.
//!
//! - [`MonotonicClock`] wraps `std::time::Instant` for real-time runs.
//! - [`SimClock`] is advanced by hand, so a simulated run can cover a
//!   ten-minute profile in milliseconds and tests control time exactly.

use core::cell::Cell;
use core::time::Duration;
use std::time::Instant;

use crate::app::ports::ClockPort;

/// Wall-clock monotonic time since construction.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl ClockPort for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<Duration>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl ClockPort for SimClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
