//! Meter: event magnitude and rate tracking

use std::time::Instant;

use parking_lot::Mutex;

use super::ewma::{Ewma, TICK_INTERVAL};

/// Point-in-time view of a [`Meter`]
#[derive(Debug, Clone, PartialEq)]
pub struct MeterSnapshot {
    /// Sum of all marked values
    pub count: i64,
    /// Number of `mark` calls
    pub marks: u64,
    /// One-minute moving average rate (per second)
    pub rate1: f64,
    /// Five-minute moving average rate (per second)
    pub rate5: f64,
    /// Fifteen-minute moving average rate (per second)
    pub rate15: f64,
    /// Average rate since the meter was created (per second)
    pub rate_mean: f64,
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    marks: u64,
    uncounted: i64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    started_at: Instant,
    last_tick: Instant,
}

impl MeterState {
    /// Catch up on every tick interval that elapsed since the last tick.
    /// Only the first one sees the pending events; the rest decay.
    fn tick_if_necessary(&mut self, now: Instant) {
        let age = now.saturating_duration_since(self.last_tick);
        if age < TICK_INTERVAL {
            return;
        }

        let ticks = (age.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        self.last_tick += TICK_INTERVAL * ticks;

        let pending = std::mem::take(&mut self.uncounted);
        for i in 0..ticks {
            let events = if i == 0 { pending } else { 0 };
            self.m1.tick(events);
            self.m5.tick(events);
            self.m15.tick(events);
        }
    }
}

/// Tracks the total magnitude of marked events and their rate over time
#[derive(Debug)]
pub struct Meter {
    state: Mutex<MeterState>,
}

impl Meter {
    /// Create a meter whose rates start now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a meter whose rates start at `now`
    pub fn starting_at(now: Instant) -> Self {
        Self {
            state: Mutex::new(MeterState {
                count: 0,
                marks: 0,
                uncounted: 0,
                m1: Ewma::one_minute(),
                m5: Ewma::five_minute(),
                m15: Ewma::fifteen_minute(),
                started_at: now,
                last_tick: now,
            }),
        }
    }

    /// Record an event of magnitude `n`
    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now());
    }

    pub fn mark_at(&self, n: i64, now: Instant) {
        let mut state = self.state.lock();
        state.tick_if_necessary(now);
        state.count = state.count.saturating_add(n);
        state.uncounted = state.uncounted.saturating_add(n);
        state.marks += 1;
    }

    /// Sum of all marked values
    pub fn count(&self) -> i64 {
        self.state.lock().count
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut state = self.state.lock();
        state.tick_if_necessary(now);

        let elapsed = now.saturating_duration_since(state.started_at).as_secs_f64();
        let rate_mean = if elapsed > 0.0 {
            state.count as f64 / elapsed
        } else {
            0.0
        };

        MeterSnapshot {
            count: state.count,
            marks: state.marks,
            rate1: state.m1.rate(),
            rate5: state.m5.rate(),
            rate15: state.m15.rate(),
            rate_mean,
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}
