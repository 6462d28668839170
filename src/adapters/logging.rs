//! Logging Publisher Adapter
//!
//! Implements the `MetricsPublisher` port by writing snapshots to the
//! tracing/logging system. Selected with `--publisher log` to run without a
//! Graphite backend.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{MetricsPublisher, PublisherFactory};
use crate::error::Result;
use crate::registry::{MetricValue, RegistrySnapshot};

/// Logs a one-line summary of every published metric
#[derive(Debug, Clone, Default)]
pub struct LoggingPublisher {
    /// Whether to log at info level (true) or debug level (false)
    info_level: bool,
}

impl LoggingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info_level() -> Self {
        Self { info_level: true }
    }

    pub fn debug_level() -> Self {
        Self { info_level: false }
    }
}

#[async_trait]
impl MetricsPublisher for LoggingPublisher {
    async fn publish(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        for metric in &snapshot.metrics {
            let (kind, count) = match &metric.value {
                MetricValue::Meter(m) => ("meter", m.count),
                MetricValue::Timer(t) => ("timer", t.count as i64),
            };

            if self.info_level {
                info!(metric = %metric.name, kind, count, "Metric snapshot");
            } else {
                debug!(metric = %metric.name, kind, count, "Metric snapshot");
            }
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        "log".to_string()
    }
}

/// Hands every cloud an info-level [`LoggingPublisher`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPublisherFactory;

impl PublisherFactory for LoggingPublisherFactory {
    fn create(&self, cloud: &str, addr: SocketAddr) -> Arc<dyn MetricsPublisher> {
        debug!(cloud, %addr, "Publishing to log instead of graphite");
        Arc::new(LoggingPublisher::info_level())
    }
}
