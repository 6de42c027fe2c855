//! Sampled timing primitives.
//!
//! Nothing here reads a clock. All values are derived from the timestamps
//! handed in by the simulation tick, in milliseconds.

use serde::{Deserialize, Serialize};

/// One discrete simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Current timestamp in milliseconds.
    pub time: f64,
    /// Milliseconds elapsed since the previous tick.
    pub delta: f64,
}

impl Tick {
    /// Creates a tick.
    #[must_use]
    pub const fn new(time: f64, delta: f64) -> Self {
        Self { time, delta }
    }
}

/// Remembers when a state was entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateClock {
    changed_at: f64,
}

impl StateClock {
    /// Starts the clock at `time`.
    #[must_use]
    pub const fn started_at(time: f64) -> Self {
        Self { changed_at: time }
    }

    /// Restarts the clock at `time`.
    pub fn restart(&mut self, time: f64) {
        self.changed_at = time;
    }

    /// Timestamp of the last restart.
    #[must_use]
    pub const fn changed_at(&self) -> f64 {
        self.changed_at
    }

    /// Milliseconds since the last restart.
    #[must_use]
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.changed_at
    }
}

/// Countdown that re-arms itself after firing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    period: f64,
    remaining: f64,
}

impl Countdown {
    /// Creates an armed countdown.
    #[must_use]
    pub const fn new(period: f64) -> Self {
        Self {
            period,
            remaining: period,
        }
    }

    /// Time left before the next firing.
    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Consumes `delta` milliseconds.
    ///
    /// Returns `true` on the step that reaches zero; the countdown is then
    /// reset to its period.
    pub fn advance(&mut self, delta: f64) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            self.remaining = self.period;
            return true;
        }
        false
    }
}
