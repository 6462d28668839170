//! Timer: duration distribution plus event rate

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::meter::Meter;
use super::sample::{percentile, UniformSample};

/// Point-in-time view of a [`Timer`]. Durations are in nanoseconds.
///
/// `count` covers every recorded event; min, max, mean and std-dev describe
/// the retained sample only.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub std_dev: f64,
    /// Retained sample, ascending
    pub sample: Vec<i64>,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

impl TimerSnapshot {
    /// Percentiles of the retained sample, in nanoseconds
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        ps.iter().map(|p| percentile(&self.sample, *p)).collect()
    }
}

#[derive(Debug)]
struct Distribution {
    count: u64,
    sample: UniformSample,
}

impl Distribution {
    fn update(&mut self, value: i64) {
        self.count += 1;
        self.sample.update(value);
    }
}

/// Min, max, mean and population standard deviation of ascending `sorted`
fn sample_stats(sorted: &[i64]) -> (i64, i64, f64, f64) {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return (0, 0, 0.0, 0.0);
    };

    let n = sorted.len() as f64;
    let mean = sorted.iter().map(|v| *v as f64).sum::<f64>() / n;
    let variance = sorted
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (min, max, mean, variance.sqrt())
}

/// Tracks the distribution of recorded durations and how often they occur
#[derive(Debug)]
pub struct Timer {
    distribution: Mutex<Distribution>,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_sample(UniformSample::default(), Instant::now())
    }

    pub fn with_sample(sample: UniformSample, now: Instant) -> Self {
        Self {
            distribution: Mutex::new(Distribution { count: 0, sample }),
            meter: Meter::starting_at(now),
        }
    }

    /// Record one event that took `elapsed`
    pub fn update(&self, elapsed: Duration) {
        self.update_at(elapsed, Instant::now());
    }

    pub fn update_at(&self, elapsed: Duration, now: Instant) {
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        self.distribution.lock().update(nanos);
        self.meter.mark_at(1, now);
    }

    pub fn count(&self) -> u64 {
        self.distribution.lock().count
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> TimerSnapshot {
        let rates = self.meter.snapshot_at(now);
        let (count, sample) = {
            let distribution = self.distribution.lock();
            (distribution.count, distribution.sample.sorted_values())
        };
        let (min, max, mean, std_dev) = sample_stats(&sample);

        TimerSnapshot {
            count,
            min,
            max,
            mean,
            std_dev,
            sample,
            rate1: rates.rate1,
            rate5: rates.rate5,
            rate15: rates.rate15,
            rate_mean: rates.rate_mean,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
