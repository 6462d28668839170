//! Simulator Configuration Schema
//!
//! Static description of the simulated fleet: the clouds metrics are
//! published from and the microservices deployed into every one of them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// Configuration for the whole simulator.
///
/// Every microservice is deployed into every cloud.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Simulated clouds, each publishing to its own Graphite instance
    #[serde(default)]
    pub clouds: Vec<CloudConfig>,

    /// Simulated microservices
    #[serde(default)]
    pub microservices: Vec<ServiceConfig>,
}

impl SimulatorConfig {
    /// Total number of metrics a single cloud will hold once every
    /// microservice has been updated at least once.
    pub fn metrics_per_cloud(&self) -> usize {
        self.microservices.iter().map(ServiceConfig::metric_count).sum()
    }

    /// Validate the configuration.
    ///
    /// Sampling assumes valid ranges, so every range is checked here
    /// instead of at generation time.
    pub fn validate(&self) -> Result<()> {
        let mut cloud_names = HashSet::new();
        for cloud in &self.clouds {
            validate_name("cloud name", &cloud.name)?;
            if !cloud_names.insert(cloud.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate cloud name '{}'",
                    cloud.name
                )));
            }
        }

        let mut service_names = HashSet::new();
        for service in &self.microservices {
            service.validate()?;
            if !service_names.insert(service.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate microservice name '{}'",
                    service.name
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Cloud Configuration
// =============================================================================

/// Static configuration of one cloud
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// Unique cloud name
    pub name: String,

    /// Graphite plaintext endpoint as `host:port`
    pub graphite_endpoint: String,
}

impl CloudConfig {
    pub fn new(name: impl Into<String>, graphite_endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphite_endpoint: graphite_endpoint.into(),
        }
    }
}

// =============================================================================
// Microservice Configuration
// =============================================================================

/// Static, cloud-agnostic configuration of a microservice.
///
/// All metric names of the service are published under `<name>.`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Microservice name
    pub name: String,

    /// Mock metrics emitted by this microservice
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, metrics: MetricsConfig) -> Self {
        Self {
            name: name.into(),
            metrics,
        }
    }

    /// Number of meters plus timers
    pub fn metric_count(&self) -> usize {
        self.metrics.meters.len() + self.metrics.timers.len()
    }

    fn validate(&self) -> Result<()> {
        validate_segment("microservice name", &self.name)?;

        let mut meter_names = HashSet::new();
        for meter in &self.metrics.meters {
            let context = format!("microservice '{}' meter '{}'", self.name, meter.name);
            validate_segment(&context, &meter.name)?;
            meter.range().validate(&context)?;
            if !meter_names.insert(meter.name.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate {}", context)));
            }
        }

        let mut timer_names = HashSet::new();
        for timer in &self.metrics.timers {
            let context = format!("microservice '{}' timer '{}'", self.name, timer.name);
            validate_segment(&context, &timer.name)?;
            timer.range().validate(&context)?;
            if timer.low < 0 {
                return Err(Error::InvalidConfig(format!(
                    "{}: low ({}) must not be negative for a duration",
                    context, timer.low
                )));
            }
            if !timer_names.insert(timer.name.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate {}", context)));
            }
        }

        Ok(())
    }
}

/// The set of mock metrics a microservice emits
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    /// Meters marked with a random magnitude on every update
    #[serde(default)]
    pub meters: Vec<MeterSpec>,

    /// Timers recording a random duration (seconds) on every update
    #[serde(default)]
    pub timers: Vec<TimerSpec>,
}

/// A named metric sampled uniformly from `[low, high)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: String,
    pub low: i64,
    pub high: i64,
}

/// A meter marking a value in `[low, high)` on every update
pub type MeterSpec = MetricSpec;

/// A timer recording an event lasting `[low, high)` seconds on every update
pub type TimerSpec = MetricSpec;

impl MetricSpec {
    pub fn new(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
        }
    }

    pub fn range(&self) -> SampleRange {
        SampleRange {
            low: self.low,
            high: self.high,
        }
    }
}

// =============================================================================
// Sample Range
// =============================================================================

/// Half-open integer range `[low, high)` samples are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub low: i64,
    pub high: i64,
}

impl SampleRange {
    /// Check that the range is non-empty
    pub fn validate(&self, context: &str) -> Result<()> {
        if self.low >= self.high {
            return Err(Error::InvalidConfig(format!(
                "{}: low ({}) must be less than high ({})",
                context, self.low, self.high
            )));
        }
        Ok(())
    }

    /// Whether `value` lies in `[low, high)`
    pub fn contains(&self, value: i64) -> bool {
        self.low <= value && value < self.high
    }
}

/// Names become Graphite path segments
fn validate_name(context: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidConfig(format!("{} must not be empty", context)));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidConfig(format!(
            "{} '{}' must not contain whitespace",
            context, name
        )));
    }
    Ok(())
}

/// Service and metric names are joined with `.` into qualified names, so a
/// dot inside one would let two services write the same metric.
fn validate_segment(context: &str, name: &str) -> Result<()> {
    validate_name(context, name)?;
    if name.contains('.') {
        return Err(Error::InvalidConfig(format!(
            "{} '{}' must not contain '.'",
            context, name
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn auth_service() -> ServiceConfig {
        ServiceConfig::new(
            "auth",
            MetricsConfig {
                meters: vec![MetricSpec::new("logins", 1, 10)],
                timers: vec![MetricSpec::new("login_latency", 0, 3)],
            },
        )
    }

    #[test]
    fn test_decode_camel_case_json() {
        let json = r#"{
            "clouds": [{"name": "prod", "graphiteEndpoint": "localhost:2003"}],
            "microservices": [{
                "name": "auth",
                "metrics": {
                    "meters": [{"name": "logins", "low": 1, "high": 10}],
                    "timers": []
                }
            }]
        }"#;

        let config: SimulatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.clouds, vec![CloudConfig::new("prod", "localhost:2003")]);
        assert_eq!(config.microservices.len(), 1);
        assert_eq!(
            config.microservices[0].metrics.meters,
            vec![MetricSpec::new("logins", 1, 10)]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_metric_lists_default_to_empty() {
        let json = r#"{"clouds": [], "microservices": [{"name": "idle"}]}"#;
        let config: SimulatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.microservices[0].metric_count(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut service = auth_service();
        service.metrics.meters[0].high = 1;
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![service],
        };

        let err = config.validate().unwrap_err();
        assert_matches!(err, Error::InvalidConfig(ref msg) if msg.contains("logins"));
    }

    #[test]
    fn test_negative_timer_rejected() {
        let mut service = auth_service();
        service.metrics.timers[0].low = -1;
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![service],
        };

        assert_matches!(config.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_negative_meter_allowed() {
        let mut service = auth_service();
        service.metrics.meters[0] = MetricSpec::new("balance_delta", -5, 5);
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![service],
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = SimulatorConfig {
            clouds: vec![
                CloudConfig::new("prod", "localhost:2003"),
                CloudConfig::new("prod", "localhost:2004"),
            ],
            microservices: vec![],
        };
        assert_matches!(config.validate(), Err(Error::InvalidConfig(ref msg)) if msg.contains("prod"));

        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![auth_service(), auth_service()],
        };
        assert_matches!(config.validate(), Err(Error::InvalidConfig(_)));

        let mut service = auth_service();
        service.metrics.meters.push(MetricSpec::new("logins", 2, 4));
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![service],
        };
        assert_matches!(config.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_same_name_meter_and_timer_allowed() {
        let mut service = auth_service();
        service.metrics.timers.push(MetricSpec::new("logins", 1, 2));
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![service],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let config = SimulatorConfig {
            clouds: vec![CloudConfig::new("us east", "localhost:2003")],
            microservices: vec![],
        };
        assert_matches!(config.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_dotted_names_rejected() {
        // "a" + "x.meter.y" and "a.meter.x" + "y" would both qualify to
        // "a.meter.x.meter.y"
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![
                ServiceConfig::new(
                    "a",
                    MetricsConfig {
                        meters: vec![MetricSpec::new("x.meter.y", 1, 2)],
                        timers: vec![],
                    },
                ),
                ServiceConfig::new(
                    "a.meter.x",
                    MetricsConfig {
                        meters: vec![MetricSpec::new("y", 1, 2)],
                        timers: vec![],
                    },
                ),
            ],
        };
        let err = config.validate().unwrap_err();
        assert_matches!(err, Error::InvalidConfig(ref msg) if msg.contains("x.meter.y"));

        let dotted_service = SimulatorConfig {
            clouds: vec![],
            microservices: vec![ServiceConfig::new("a.meter.x", MetricsConfig::default())],
        };
        assert_matches!(dotted_service.validate(), Err(Error::InvalidConfig(ref msg)) if msg.contains("'.'"));

        let dotted_timer = SimulatorConfig {
            clouds: vec![],
            microservices: vec![ServiceConfig::new(
                "auth",
                MetricsConfig {
                    meters: vec![],
                    timers: vec![MetricSpec::new("login.p99", 0, 3)],
                },
            )],
        };
        assert_matches!(dotted_timer.validate(), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_metrics_per_cloud() {
        let config = SimulatorConfig {
            clouds: vec![],
            microservices: vec![auth_service(), ServiceConfig::new("billing", MetricsConfig::default())],
        };
        assert_eq!(config.metrics_per_cloud(), 2);
    }

    #[test]
    fn test_sample_range_contains() {
        let range = SampleRange { low: 1, high: 10 };
        assert!(range.contains(1));
        assert!(range.contains(9));
        assert!(!range.contains(10));
        assert!(!range.contains(0));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_range_validation_matches_ordering(low in -1000i64..1000, high in -1000i64..1000) {
                let service = ServiceConfig::new(
                    "svc",
                    MetricsConfig {
                        meters: vec![MetricSpec::new("m", low, high)],
                        timers: vec![],
                    },
                );
                let config = SimulatorConfig { clouds: vec![], microservices: vec![service] };
                prop_assert_eq!(config.validate().is_ok(), low < high);
            }
        }
    }
}
