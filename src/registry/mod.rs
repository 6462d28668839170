//! Metric Registry
//!
//! In-memory namespace of meters and timers for one cloud. Entries are
//! created lazily on first use and live as long as the registry.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    Registry (per cloud)                    │
//! │   "auth.meter.logins" → Meter   "auth.timer.login" → Timer │
//! └───────────────────────────────────────────────────────────┘
//!        ▲                         ▲
//!        │ prefix "auth."          │ prefix "billing."
//! ┌──────────────┐          ┌──────────────┐
//! │ScopedRegistry│          │ScopedRegistry│
//! └──────────────┘          └──────────────┘
//! ```
//!
//! The registry is internally synchronised: the update loop marks metrics
//! while the flush loop takes snapshots.

mod ewma;
mod meter;
mod sample;
mod timer;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

pub use ewma::{Ewma, TICK_INTERVAL};
pub use meter::{Meter, MeterSnapshot};
pub use sample::{percentile, UniformSample, DEFAULT_RESERVOIR_SIZE};
pub use timer::{Timer, TimerSnapshot};

// =============================================================================
// Registry
// =============================================================================

/// Named meters and timers of one cloud
#[derive(Debug, Default)]
pub struct Registry {
    meters: RwLock<BTreeMap<String, Arc<Meter>>>,
    timers: RwLock<BTreeMap<String, Arc<Timer>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get or create a meter
    pub fn meter(&self, name: &str) -> Arc<Meter> {
        let meters = self.meters.read();
        if let Some(meter) = meters.get(name) {
            return meter.clone();
        }
        drop(meters);

        let mut meters = self.meters.write();
        meters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Meter::new()))
            .clone()
    }

    /// Get or create a timer
    pub fn timer(&self, name: &str) -> Arc<Timer> {
        let timers = self.timers.read();
        if let Some(timer) = timers.get(name) {
            return timer.clone();
        }
        drop(timers);

        let mut timers = self.timers.write();
        timers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Timer::new()))
            .clone()
    }

    pub fn get_meter(&self, name: &str) -> Option<Arc<Meter>> {
        self.meters.read().get(name).cloned()
    }

    pub fn get_timer(&self, name: &str) -> Option<Arc<Timer>> {
        self.timers.read().get(name).cloned()
    }

    /// Number of registered metrics
    pub fn len(&self) -> usize {
        self.meters.read().len() + self.timers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted names of every registered metric
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .meters
            .read()
            .keys()
            .chain(self.timers.read().keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// View of this registry that prefixes every name with `prefix`
    pub fn scoped(self: &Arc<Self>, prefix: impl Into<String>) -> ScopedRegistry {
        ScopedRegistry {
            parent: Arc::clone(self),
            prefix: prefix.into(),
        }
    }

    /// Capture every metric. Metrics keep accumulating afterwards.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let now = Instant::now();

        // clone the handles so marking is never blocked on snapshot math
        let meters: Vec<(String, Arc<Meter>)> = self
            .meters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let timers: Vec<(String, Arc<Timer>)> = self
            .timers
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut metrics: Vec<MetricSnapshot> = meters
            .into_iter()
            .map(|(name, meter)| MetricSnapshot {
                name,
                value: MetricValue::Meter(meter.snapshot_at(now)),
            })
            .chain(timers.into_iter().map(|(name, timer)| MetricSnapshot {
                name,
                value: MetricValue::Timer(timer.snapshot_at(now)),
            }))
            .collect();
        metrics.sort_by(|a, b| a.name.cmp(&b.name));

        RegistrySnapshot {
            taken_at: Utc::now(),
            metrics,
        }
    }
}

// =============================================================================
// Scoped Registry
// =============================================================================

/// Prefixed view of a parent [`Registry`].
///
/// Every name passed in is stored in the parent as `<prefix><name>`.
#[derive(Debug, Clone)]
pub struct ScopedRegistry {
    parent: Arc<Registry>,
    prefix: String,
}

impl ScopedRegistry {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Fully-qualified name of `name` in the parent registry
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn meter(&self, name: &str) -> Arc<Meter> {
        self.parent.meter(&self.qualify(name))
    }

    pub fn timer(&self, name: &str) -> Arc<Timer> {
        self.parent.timer(&self.qualify(name))
    }

    pub fn parent(&self) -> &Arc<Registry> {
        &self.parent
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Value of a metric at snapshot time
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Meter(MeterSnapshot),
    Timer(TimerSnapshot),
}

/// One named metric in a [`RegistrySnapshot`]
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub name: String,
    pub value: MetricValue,
}

/// Every metric of a registry at one point in time, sorted by name
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    pub taken_at: DateTime<Utc>,
    pub metrics: Vec<MetricSnapshot>,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.value)
    }

    pub fn meter(&self, name: &str) -> Option<&MeterSnapshot> {
        match self.get(name)? {
            MetricValue::Meter(meter) => Some(meter),
            MetricValue::Timer(_) => None,
        }
    }

    pub fn timer(&self, name: &str) -> Option<&TimerSnapshot> {
        match self.get(name)? {
            MetricValue::Timer(timer) => Some(timer),
            MetricValue::Meter(_) => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }
}
