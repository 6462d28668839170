//! Exponentially weighted moving averages for meter rates

use std::time::Duration;

/// Interval at which meters fold pending events into their moving averages
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average of an event rate (events/second),
/// ticked every [`TICK_INTERVAL`].
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// Average decaying over `minutes`, ticked every [`TICK_INTERVAL`]
    pub fn over_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self {
            alpha,
            rate: 0.0,
            initialized: false,
        }
    }

    pub fn one_minute() -> Self {
        Self::over_minutes(1.0)
    }

    pub fn five_minute() -> Self {
        Self::over_minutes(5.0)
    }

    pub fn fifteen_minute() -> Self {
        Self::over_minutes(15.0)
    }

    /// Fold the events counted during the last tick interval into the average
    pub fn tick(&mut self, events: i64) {
        let instant_rate = events as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Current rate in events per second
    pub fn rate(&self) -> f64 {
        self.rate
    }
}
