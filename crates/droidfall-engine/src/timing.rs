//! Simulation timing.
//!
//! Produces fixed-size ticks, either as fast as possible or paced against
//! the wall clock with an accumulator.

use droidfall_common::Tick;
use std::time::{Duration, Instant};

/// Maximum fixed updates per frame to prevent spiral of death.
const MAX_UPDATES: u32 = 10;

/// Fixed timestep clock.
#[derive(Debug)]
pub struct FixedStep {
    /// Milliseconds per tick
    step_ms: f64,
    /// Simulated time of the last tick
    now_ms: f64,
    /// Ticks produced so far
    ticks: u64,
    /// Wall time waiting to be simulated, in ms
    accumulator: f64,
    /// Wall time of the last frame
    last_frame: Instant,
    /// Maximum wall delta per frame, in ms
    max_frame_ms: f64,
}

impl FixedStep {
    /// Create a clock producing `tick_rate` ticks per simulated second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            step_ms: 1000.0 / f64::from(tick_rate.max(1)),
            now_ms: 0.0,
            ticks: 0,
            accumulator: 0.0,
            last_frame: Instant::now(),
            max_frame_ms: 250.0,
        }
    }

    /// Milliseconds per tick.
    #[must_use]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Simulated time of the last tick.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Ticks produced so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Produces the next tick.
    pub fn advance(&mut self) -> Tick {
        self.ticks += 1;
        self.now_ms = self.ticks as f64 * self.step_ms;
        Tick::new(self.now_ms, self.step_ms)
    }

    /// Accumulate wall time.
    /// Returns the number of ticks that should be simulated.
    pub fn accumulate(&mut self, dt_ms: f64) -> u32 {
        self.accumulator += dt_ms.min(self.max_frame_ms);
        let mut count = 0;

        while self.accumulator >= self.step_ms && count < MAX_UPDATES {
            self.accumulator -= self.step_ms;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.step_ms * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Measures the wall time since the last frame and accumulates it.
    pub fn frame(&mut self) -> u32 {
        let now = Instant::now();
        let dt_ms = (now - self.last_frame).as_secs_f64() * 1000.0;
        self.last_frame = now;
        self.accumulate(dt_ms)
    }

    /// Sleep until the next tick is due.
    pub fn sleep_remainder(&self) {
        let budget = Duration::from_secs_f64((self.step_ms - self.accumulator).max(0.0) / 1000.0);
        let elapsed = self.last_frame.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }

    /// Restarts wall-clock tracking, discarding time spent outside the loop.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.accumulator = 0.0;
    }
}
