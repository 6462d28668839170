//! Simulated microservice instance

use std::time::Duration;

use crate::config::ServiceConfig;
use crate::registry::ScopedRegistry;

use super::generator::MetricGenerator;

/// Name prefix of every meter inside a service namespace
pub const METER_PREFIX: &str = "meter.";

/// Name prefix of every timer inside a service namespace
pub const TIMER_PREFIX: &str = "timer.";

/// One microservice deployed into one cloud.
///
/// Records its mock metrics into a namespace where every name starts with
/// `<service>.`, so two services never share a metric.
#[derive(Debug)]
pub struct ServiceInstance {
    config: ServiceConfig,
    namespace: ScopedRegistry,
    generator: MetricGenerator,
}

impl ServiceInstance {
    pub fn new(config: ServiceConfig, namespace: ScopedRegistry, generator: MetricGenerator) -> Self {
        Self {
            config,
            namespace,
            generator,
        }
    }

    /// Namespace prefix for a service named `name`
    pub fn namespace_prefix(name: &str) -> String {
        format!("{}.", name)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn namespace(&self) -> &ScopedRegistry {
        &self.namespace
    }

    /// Fully-qualified names this instance writes to, meters first
    pub fn metric_names(&self) -> Vec<String> {
        let meters = self
            .config
            .metrics
            .meters
            .iter()
            .map(|m| self.namespace.qualify(&format!("{}{}", METER_PREFIX, m.name)));
        let timers = self
            .config
            .metrics
            .timers
            .iter()
            .map(|t| self.namespace.qualify(&format!("{}{}", TIMER_PREFIX, t.name)));
        meters.chain(timers).collect()
    }

    /// Sample every configured metric once: meters are marked with the
    /// sampled magnitude, timers record the sample as seconds.
    pub fn update(&mut self) {
        for meter in &self.config.metrics.meters {
            let value = self.generator.sample(meter.range());
            self.namespace
                .meter(&format!("{}{}", METER_PREFIX, meter.name))
                .mark(value);
        }

        for timer in &self.config.metrics.timers {
            // validation rejects negative timer ranges
            let secs = self.generator.sample(timer.range()).max(0) as u64;
            self.namespace
                .timer(&format!("{}{}", TIMER_PREFIX, timer.name))
                .update(Duration::from_secs(secs));
        }
    }
}
