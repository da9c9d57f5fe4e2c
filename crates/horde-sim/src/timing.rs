//! Wall-clock pacing for realtime runs.
//!
//! Converts elapsed real time into a whole number of fixed simulation steps.

use std::time::{Duration, Instant};

/// Most fixed steps run for one batch of elapsed time.
const MAX_STEPS_PER_BATCH: u32 = 10;

/// Fixed-timestep clock.
#[derive(Debug)]
pub struct StepClock {
    /// Time of the last poll
    last_poll: Instant,
    /// Time not yet consumed by fixed steps
    accumulator: f32,
    /// Fixed timestep
    fixed_dt: f32,
    /// Longest elapsed time accepted from one poll
    max_dt: f32,
}

impl StepClock {
    /// Creates a clock stepping every `fixed_dt` seconds.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            last_poll: Instant::now(),
            accumulator: 0.0,
            fixed_dt: fixed_dt.max(0.001),
            max_dt: 0.25,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Seconds since the last poll, clamped to `max_dt`.
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_poll).as_secs_f32();
        self.last_poll = now;
        dt.min(self.max_dt)
    }

    /// Accumulate time and return the number of fixed steps to run.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_BATCH {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog instead of catching up
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Sleeps until the next step is due.
    pub fn sleep_until_next(&self) {
        let budget = Duration::from_secs_f32((self.fixed_dt - self.accumulator).max(0.0));
        let elapsed = self.last_poll.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }

    /// Reset timing (call after a pause).
    pub fn reset(&mut self) {
        self.last_poll = Instant::now();
        self.accumulator = 0.0;
    }
}
