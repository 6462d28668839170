//! Runtime Settings
//!
//! Knobs that are not part of the fleet description: loop cadence,
//! Graphite output options and sampling seed.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

use super::loader::DEFAULT_CONFIG_PATH;

/// Default time interval for updating metrics within memory
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Default time interval for flushing metrics from memory to Graphite
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on a single Graphite publish (connect + write)
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timer percentiles
pub const DEFAULT_PERCENTILES: [f64; 5] = [0.5, 0.75, 0.95, 0.99, 0.999];

// =============================================================================
// Environment Settings
// =============================================================================

/// Cadence of the per-cloud loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentSettings {
    /// Interval between metric update cycles
    pub update_interval: Duration,

    /// Interval between flushes to the backend
    pub flush_interval: Duration,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl EnvironmentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.update_interval.is_zero() {
            return Err(Error::InvalidSettings(
                "update interval must be greater than 0".to_string(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(Error::InvalidSettings(
                "flush interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Graphite Settings
// =============================================================================

/// Unit timer values are expressed in when published
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DurationUnit {
    #[default]
    #[value(name = "ns")]
    Nanoseconds,
    #[value(name = "us")]
    Microseconds,
    #[value(name = "ms")]
    Milliseconds,
    #[value(name = "s")]
    Seconds,
}

impl DurationUnit {
    /// Number of nanoseconds in one unit
    pub fn nanos(&self) -> u64 {
        match self {
            DurationUnit::Nanoseconds => 1,
            DurationUnit::Microseconds => 1_000,
            DurationUnit::Milliseconds => 1_000_000,
            DurationUnit::Seconds => 1_000_000_000,
        }
    }
}

impl std::fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationUnit::Nanoseconds => write!(f, "ns"),
            DurationUnit::Microseconds => write!(f, "us"),
            DurationUnit::Milliseconds => write!(f, "ms"),
            DurationUnit::Seconds => write!(f, "s"),
        }
    }
}

/// Output options for the Graphite publisher
#[derive(Debug, Clone, PartialEq)]
pub struct GraphiteSettings {
    /// Path prefix prepended to every metric (no prefix when empty)
    pub prefix: String,

    /// Percentiles reported for every timer, each in (0, 1)
    pub percentiles: Vec<f64>,

    /// Unit of published timer values
    pub duration_unit: DurationUnit,

    /// Bound on connect + write of one publish
    pub timeout: Duration,
}

impl Default for GraphiteSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            duration_unit: DurationUnit::default(),
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

impl GraphiteSettings {
    pub fn validate(&self) -> Result<()> {
        for p in &self.percentiles {
            if !(*p > 0.0 && *p < 1.0) {
                return Err(Error::InvalidSettings(format!(
                    "percentile {} must lie strictly between 0 and 1",
                    p
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidSettings(
                "publish timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Simulator Settings
// =============================================================================

/// Backend every cloud publishes its snapshots to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PublisherKind {
    /// Graphite plaintext over TCP to the cloud's endpoint
    #[default]
    Graphite,
    /// Log each snapshot instead of sending it anywhere
    Log,
}

/// Everything the orchestrator needs besides the fleet configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    /// Path of the fleet configuration file
    pub config_path: PathBuf,

    /// Loop cadence shared by every cloud
    pub environment: EnvironmentSettings,

    /// Graphite output options
    pub graphite: GraphiteSettings,

    /// Where snapshots are published
    pub publisher: PublisherKind,

    /// Base seed for metric sampling; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            environment: EnvironmentSettings::default(),
            graphite: GraphiteSettings::default(),
            publisher: PublisherKind::default(),
            seed: None,
        }
    }
}

impl SimulatorSettings {
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        self.graphite.validate()
    }
}
