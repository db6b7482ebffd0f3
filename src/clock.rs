use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of elapsed time for a session.
///
/// Times are measured from an arbitrary epoch fixed when the clock is created,
/// so only differences between two readings are meaningful.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Production clock backed by the monotonic system clock
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Virtual clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Fixed-interval schedule measured against a [`Clock`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cadence {
    interval: Duration,
    next_due: Duration,
}

impl Cadence {
    /// First firing is one `interval` after `start`
    pub fn starting_at(start: Duration, interval: Duration) -> Self {
        Self {
            interval,
            next_due: start + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_due
    }

    /// Mark the pending firing as done
    pub fn fire(&mut self) {
        self.next_due += self.interval;
    }
}
