//! Uniform reservoir sample for timer percentiles

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of values retained for percentile estimation
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Bounded uniform sample of an unbounded stream (Vitter's Algorithm R)
#[derive(Debug)]
pub struct UniformSample {
    capacity: usize,
    seen: u64,
    values: Vec<i64>,
    rng: StdRng,
}

impl UniformSample {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            capacity,
            seen: 0,
            values: Vec::with_capacity(capacity.min(DEFAULT_RESERVOIR_SIZE)),
            rng,
        }
    }

    pub fn update(&mut self, value: i64) {
        self.seen += 1;
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            let j = self.rng.random_range(0..self.seen);
            if (j as usize) < self.capacity {
                self.values[j as usize] = value;
            }
        }
    }

    /// Values currently retained, in ascending order
    pub fn sorted_values(&self) -> Vec<i64> {
        let mut values = self.values.clone();
        values.sort_unstable();
        values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for UniformSample {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVOIR_SIZE)
    }
}

/// Percentile `p` in (0, 1) of ascending `sorted`, interpolating between
/// neighbours at position `p * (n + 1)`.
pub fn percentile(sorted: &[i64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }

    let pos = p * (n as f64 + 1.0);
    if pos < 1.0 {
        sorted[0] as f64
    } else if pos >= n as f64 {
        sorted[n - 1] as f64
    } else {
        let lower = sorted[pos as usize - 1] as f64;
        let upper = sorted[pos as usize] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_then_stays_bounded() {
        let mut sample = UniformSample::with_rng(10, StdRng::seed_from_u64(7));
        for v in 0..1000 {
            sample.update(v);
        }
        assert_eq!(sample.len(), 10);
        assert!(sample.sorted_values().iter().all(|v| (0..1000).contains(v)));
    }

    #[test]
    fn test_percentile_interpolation() {
        let values: Vec<i64> = (1..=100).collect();
        assert!((percentile(&values, 0.5) - 50.5).abs() < 1e-9);
        assert!((percentile(&values, 0.75) - 75.75).abs() < 1e-9);
        assert_eq!(percentile(&values, 0.999), 100.0);
        assert_eq!(percentile(&[42], 0.5), 42.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_low_percentile_clamps_to_min() {
        let values = vec![3, 5, 9];
        assert_eq!(percentile(&values, 0.1), 3.0);
    }
}
