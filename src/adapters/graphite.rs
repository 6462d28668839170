//! Graphite Publisher Adapter
//!
//! Implements the `MetricsPublisher` port over the Graphite plaintext
//! protocol: one `<path> <value> <timestamp>` line per value, written to a
//! fresh TCP connection on every publish. The connection is opened even for
//! an empty snapshot.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::config::GraphiteSettings;
use crate::domain::ports::{MetricsPublisher, PublisherFactory};
use crate::error::{Error, Result};
use crate::registry::{MeterSnapshot, MetricValue, RegistrySnapshot, TimerSnapshot};

// =============================================================================
// Publisher
// =============================================================================

/// Publishes registry snapshots to one Graphite instance
#[derive(Debug, Clone)]
pub struct GraphitePublisher {
    addr: SocketAddr,
    settings: GraphiteSettings,
}

impl GraphitePublisher {
    pub fn new(addr: SocketAddr, settings: GraphiteSettings) -> Self {
        Self { addr, settings }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn send(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(self.addr).await?;
        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await
    }
}

#[async_trait]
impl MetricsPublisher for GraphitePublisher {
    #[instrument(skip(self, snapshot), fields(endpoint = %self.addr, metrics = snapshot.len()))]
    async fn publish(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        // connects even when the payload is empty
        let payload = format_snapshot(snapshot, &self.settings, snapshot.taken_at.timestamp());

        match timeout(self.settings.timeout, self.send(payload.as_bytes())).await {
            Ok(Ok(())) => {
                debug!(bytes = payload.len(), "Wrote snapshot to graphite");
                Ok(())
            }
            Ok(Err(source)) => Err(Error::Publish {
                endpoint: self.addr.to_string(),
                source,
            }),
            Err(_) => Err(Error::PublishTimeout {
                endpoint: self.addr.to_string(),
                timeout: self.settings.timeout,
            }),
        }
    }

    fn endpoint(&self) -> String {
        self.addr.to_string()
    }
}

/// Creates a [`GraphitePublisher`] per cloud with shared output settings
#[derive(Debug, Clone, Default)]
pub struct GraphitePublisherFactory {
    settings: GraphiteSettings,
}

impl GraphitePublisherFactory {
    pub fn new(settings: GraphiteSettings) -> Self {
        Self { settings }
    }
}

impl PublisherFactory for GraphitePublisherFactory {
    fn create(&self, _cloud: &str, addr: SocketAddr) -> Arc<dyn MetricsPublisher> {
        Arc::new(GraphitePublisher::new(addr, self.settings.clone()))
    }
}

// =============================================================================
// Plaintext Encoding
// =============================================================================

/// Render `snapshot` as Graphite plaintext lines stamped with `timestamp`
/// (unix seconds).
pub fn format_snapshot(snapshot: &RegistrySnapshot, settings: &GraphiteSettings, timestamp: i64) -> String {
    let mut out = String::new();
    for metric in &snapshot.metrics {
        let path = metric_path(&settings.prefix, &metric.name);
        match &metric.value {
            MetricValue::Meter(meter) => write_meter(&mut out, &path, meter, timestamp),
            MetricValue::Timer(timer) => write_timer(&mut out, &path, timer, settings, timestamp),
        }
    }
    out
}

fn metric_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix.trim_end_matches('.'), name)
    }
}

fn write_meter(out: &mut String, path: &str, m: &MeterSnapshot, ts: i64) {
    let _ = writeln!(out, "{}.count {} {}", path, m.count, ts);
    let _ = writeln!(out, "{}.one-minute {:.2} {}", path, m.rate1, ts);
    let _ = writeln!(out, "{}.five-minute {:.2} {}", path, m.rate5, ts);
    let _ = writeln!(out, "{}.fifteen-minute {:.2} {}", path, m.rate15, ts);
    let _ = writeln!(out, "{}.mean {:.2} {}", path, m.rate_mean, ts);
}

fn write_timer(out: &mut String, path: &str, t: &TimerSnapshot, settings: &GraphiteSettings, ts: i64) {
    let du = settings.duration_unit.nanos() as f64;
    let du_int = settings.duration_unit.nanos() as i64;

    let _ = writeln!(out, "{}.count {} {}", path, t.count, ts);
    let _ = writeln!(out, "{}.min {} {}", path, t.min / du_int, ts);
    let _ = writeln!(out, "{}.max {} {}", path, t.max / du_int, ts);
    let _ = writeln!(out, "{}.mean {:.2} {}", path, t.mean / du, ts);
    let _ = writeln!(out, "{}.std-dev {:.2} {}", path, t.std_dev / du, ts);
    for (p, value) in settings
        .percentiles
        .iter()
        .zip(t.percentiles(&settings.percentiles))
    {
        let _ = writeln!(
            out,
            "{}.{}-percentile {:.2} {}",
            path,
            percentile_key(*p),
            value / du,
            ts
        );
    }
    let _ = writeln!(out, "{}.one-minute {:.2} {}", path, t.rate1, ts);
    let _ = writeln!(out, "{}.five-minute {:.2} {}", path, t.rate5, ts);
    let _ = writeln!(out, "{}.fifteen-minute {:.2} {}", path, t.rate15, ts);
    let _ = writeln!(out, "{}.mean-rate {:.2} {}", path, t.rate_mean, ts);
}

/// Path segment for percentile `p`: `p * 100` without its decimal point
/// (0.5 → `50`, 0.999 → `999`).
pub fn percentile_key(p: f64) -> String {
    let scaled = (p * 100.0 * 1e6).round() / 1e6;
    scaled.to_string().replacen('.', "", 1)
}

// =============================================================================
// Tests
// =============================================================================
