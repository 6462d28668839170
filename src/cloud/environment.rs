//! Simulated cloud environment
//!
//! An [`Environment`] owns one metrics registry and the service instances
//! deployed into it. Running it drives two independent background loops:
//!
//! - **update**: every `update_interval`, every instance generates one round
//!   of samples (in deployment order)
//! - **flush**: every `flush_interval`, the whole registry is published to
//!   the cloud's backend
//!
//! Both loops stop on cancellation; a final flush follows once both have
//! been joined.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::{CloudConfig, EnvironmentSettings, ServiceConfig};
use crate::domain::ports::{MetricsPublisher, PublisherFactory};
use crate::error::{Error, Result};
use crate::microservice::{MetricGenerator, ServiceInstance};
use crate::registry::Registry;

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle of an environment. Traversed once, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Created,
    Deploying,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Created => "created",
            LifecycleState::Deploying => "deploying",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Outcome of one [`Environment::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentReport {
    pub name: String,
    /// Completed update cycles
    pub update_cycles: u64,
    /// Periodic flushes attempted (final flush excluded)
    pub flush_attempts: u64,
    /// Periodic flushes that failed
    pub flush_failures: u64,
    pub final_flush_ok: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct FlushStats {
    attempts: u64,
    failures: u64,
}

// =============================================================================
// Environment
// =============================================================================

/// Resolve a `host:port` endpoint to its first socket address
pub async fn resolve_endpoint(endpoint: &str) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host(endpoint)
        .await
        .map_err(|e| Error::EndpointResolution {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    addrs.next().ok_or_else(|| Error::EndpointResolution {
        endpoint: endpoint.to_string(),
        reason: "no addresses returned".to_string(),
    })
}

/// A simulated cloud: one registry, its services, and its backend
pub struct Environment {
    config: CloudConfig,
    settings: EnvironmentSettings,
    addr: SocketAddr,
    registry: Arc<Registry>,
    publisher: Arc<dyn MetricsPublisher>,
    services: Vec<ServiceInstance>,
    seed: Option<u64>,
    state: watch::Sender<LifecycleState>,
}

impl Environment {
    /// Resolve the cloud's backend endpoint and build its publisher.
    ///
    /// Fails with [`Error::EndpointResolution`] if the endpoint cannot be
    /// resolved.
    pub async fn new(
        config: CloudConfig,
        settings: EnvironmentSettings,
        factory: &dyn PublisherFactory,
    ) -> Result<Self> {
        let addr = resolve_endpoint(&config.graphite_endpoint).await?;
        let publisher = factory.create(&config.name, addr);
        Ok(Self::with_publisher(config, settings, addr, publisher))
    }

    /// Build an environment around an already resolved publisher
    pub fn with_publisher(
        config: CloudConfig,
        settings: EnvironmentSettings,
        addr: SocketAddr,
        publisher: Arc<dyn MetricsPublisher>,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        debug!(cloud = %config.name, %addr, "Environment created");
        Self {
            config,
            settings,
            addr,
            registry: Registry::new(),
            publisher,
            services: Vec::new(),
            seed: None,
            state,
        }
    }

    /// Seed the generators of every service deployed from now on.
    /// Instance `i` gets `seed + i`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn services(&self) -> &[ServiceInstance] {
        &self.services
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state transitions, including those made while running
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            info!(cloud = %self.config.name, from = %prev, to = %next, "Environment state changed");
        }
    }

    /// Deploy a service into this environment under its own namespace
    pub fn deploy(&mut self, service: ServiceConfig) {
        if self.state() == LifecycleState::Created {
            self.transition(LifecycleState::Deploying);
        }

        let index = self.services.len() as u64;
        let generator = MetricGenerator::new(self.seed.map(|s| s.wrapping_add(index)));
        let namespace = self
            .registry
            .scoped(ServiceInstance::namespace_prefix(&service.name));

        info!(
            cloud = %self.config.name,
            service = %service.name,
            metrics = service.metric_count(),
            "Deployed service"
        );
        self.services
            .push(ServiceInstance::new(service, namespace, generator));
    }

    /// Run both loops until `token` is cancelled, then flush once more.
    pub async fn run(self, token: CancellationToken) -> EnvironmentReport {
        let span = info_span!("cloud", name = %self.config.name);
        self.run_inner(token).instrument(span).await
    }

    async fn run_inner(mut self, token: CancellationToken) -> EnvironmentReport {
        self.transition(LifecycleState::Running);
        info!(
            endpoint = %self.addr,
            services = self.services.len(),
            update_interval = ?self.settings.update_interval,
            flush_interval = ?self.settings.flush_interval,
            "Environment running"
        );

        let services = std::mem::take(&mut self.services);
        let update = tokio::spawn(
            update_loop(services, self.settings.update_interval, token.clone())
                .in_current_span(),
        );
        let flush = tokio::spawn(
            flush_loop(
                Arc::clone(&self.registry),
                Arc::clone(&self.publisher),
                self.settings.flush_interval,
                token.clone(),
            )
            .in_current_span(),
        );

        token.cancelled().await;
        self.transition(LifecycleState::Stopping);

        let update_cycles = match update.await {
            Ok((cycles, services)) => {
                self.services = services;
                cycles
            }
            Err(e) => {
                let err = Error::Internal(format!("update loop failed: {}", e));
                error!(error = %err, "Update loop terminated abnormally");
                0
            }
        };
        let stats = match flush.await {
            Ok(stats) => stats,
            Err(e) => {
                let err = Error::Internal(format!("flush loop failed: {}", e));
                error!(error = %err, "Flush loop terminated abnormally");
                FlushStats::default()
            }
        };

        let final_flush_ok = flush_once(&self.registry, self.publisher.as_ref()).await;
        self.transition(LifecycleState::Stopped);

        let report = EnvironmentReport {
            name: self.config.name.clone(),
            update_cycles,
            flush_attempts: stats.attempts,
            flush_failures: stats.failures,
            final_flush_ok,
        };
        info!(
            update_cycles = report.update_cycles,
            flush_attempts = report.flush_attempts,
            flush_failures = report.flush_failures,
            final_flush_ok = report.final_flush_ok,
            "Environment stopped"
        );
        report
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.config.name)
            .field("addr", &self.addr)
            .field("services", &self.services.len())
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Background Loops
// =============================================================================

/// Ticker whose first tick fires one `period` from now
fn ticker(period: Duration) -> tokio::time::Interval {
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tick
}

/// Returns the number of completed cycles and hands the instances back
async fn update_loop(
    mut services: Vec<ServiceInstance>,
    period: Duration,
    token: CancellationToken,
) -> (u64, Vec<ServiceInstance>) {
    let mut tick = ticker(period);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            biased;

            // a tick due at the moment of cancellation still runs
            _ = tick.tick() => {
                for service in services.iter_mut() {
                    service.update();
                }
                cycles += 1;
            }

            _ = token.cancelled() => {
                debug!(cycles, "Update loop stopping");
                break;
            }
        }
    }

    (cycles, services)
}

async fn flush_loop(
    registry: Arc<Registry>,
    publisher: Arc<dyn MetricsPublisher>,
    period: Duration,
    token: CancellationToken,
) -> FlushStats {
    let mut tick = ticker(period);
    let mut stats = FlushStats::default();

    loop {
        tokio::select! {
            biased;

            _ = tick.tick() => {
                stats.attempts += 1;
                if !flush_once(&registry, publisher.as_ref()).await {
                    stats.failures += 1;
                }
            }

            _ = token.cancelled() => {
                debug!(attempts = stats.attempts, "Flush loop stopping");
                break;
            }
        }
    }

    stats
}

/// Publish the current registry contents. Failures are logged, never raised.
async fn flush_once(registry: &Registry, publisher: &dyn MetricsPublisher) -> bool {
    let snapshot = registry.snapshot();
    match publisher.publish(&snapshot).await {
        Ok(()) => {
            info!(metrics = snapshot.len(), "Flushed metrics");
            true
        }
        Err(e) => {
            error!(endpoint = %publisher.endpoint(), error = %e, "Failed to flush metrics");
            false
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
