//! Simulation orchestrator
//!
//! Builds one [`Environment`] per configured cloud, deploys every
//! microservice into every environment, and runs them all until the
//! cancellation token fires.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::adapters::{GraphitePublisherFactory, LoggingPublisherFactory};
use crate::cloud::{Environment, EnvironmentReport};
use crate::config::{load_from_path, PublisherKind, SimulatorConfig, SimulatorSettings};
use crate::domain::ports::PublisherFactory;
use crate::error::{Error, Result};

/// Per-environment reports of a finished run, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub environments: Vec<EnvironmentReport>,
    /// Clouds skipped because their endpoint could not be resolved
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn report(&self, cloud: &str) -> Option<&EnvironmentReport> {
        self.environments.iter().find(|r| r.name == cloud)
    }

    pub fn total_update_cycles(&self) -> u64 {
        self.environments.iter().map(|r| r.update_cycles).sum()
    }
}

/// Load the configuration named by `settings` and run it.
pub async fn run_from_settings(
    settings: SimulatorSettings,
    token: CancellationToken,
) -> Result<RunSummary> {
    settings.validate()?;
    let config = load_from_path(&settings.config_path)?;
    run(config, settings, token).await
}

/// Run `config` until `token` is cancelled, publishing to the backend
/// selected by `settings.publisher`
pub async fn run(
    config: SimulatorConfig,
    settings: SimulatorSettings,
    token: CancellationToken,
) -> Result<RunSummary> {
    let factory = publisher_factory(&settings);
    run_with_factory(config, settings, factory, token).await
}

/// Factory for the configured publisher kind
pub fn publisher_factory(settings: &SimulatorSettings) -> Arc<dyn PublisherFactory> {
    match settings.publisher {
        PublisherKind::Graphite => {
            Arc::new(GraphitePublisherFactory::new(settings.graphite.clone()))
        }
        PublisherKind::Log => Arc::new(LoggingPublisherFactory),
    }
}

/// Run `config` with publishers built by `factory`.
///
/// Clouds whose endpoint cannot be resolved are logged and skipped; if none
/// remain the run fails with [`Error::NoEnvironments`].
#[instrument(skip_all, fields(clouds = config.clouds.len(), microservices = config.microservices.len()))]
pub async fn run_with_factory(
    config: SimulatorConfig,
    settings: SimulatorSettings,
    factory: Arc<dyn PublisherFactory>,
    token: CancellationToken,
) -> Result<RunSummary> {
    let (environments, skipped) = build_environments(&config, &settings, factory.as_ref()).await;
    if environments.is_empty() {
        error!("No cloud could be constructed");
        return Err(Error::NoEnvironments);
    }

    info!(
        environments = environments.len(),
        skipped = skipped.len(),
        metrics_per_cloud = config.metrics_per_cloud(),
        "Starting simulation"
    );

    let reports = join_all(
        environments
            .into_iter()
            .map(|env| env.run(token.clone())),
    )
    .await;

    let summary = RunSummary {
        environments: reports,
        skipped,
    };
    info!(
        environments = summary.environments.len(),
        update_cycles = summary.total_update_cycles(),
        "Simulation stopped"
    );
    Ok(summary)
}

/// Construct every resolvable cloud and deploy all microservices into it.
/// Returns the environments and the names of skipped clouds.
pub async fn build_environments(
    config: &SimulatorConfig,
    settings: &SimulatorSettings,
    factory: &dyn PublisherFactory,
) -> (Vec<Environment>, Vec<String>) {
    let mut environments = Vec::with_capacity(config.clouds.len());
    let mut skipped = Vec::new();

    for (position, cloud) in config.clouds.iter().enumerate() {
        let env = match Environment::new(cloud.clone(), settings.environment, factory).await {
            Ok(env) => env,
            Err(e) => {
                warn!(
                    cloud = %cloud.name,
                    endpoint = %cloud.graphite_endpoint,
                    error = %e,
                    "Skipping cloud"
                );
                skipped.push(cloud.name.clone());
                continue;
            }
        };

        let mut env = env.with_seed(settings.seed.map(|s| environment_seed(s, position)));
        for service in &config.microservices {
            env.deploy(service.clone());
        }
        environments.push(env);
    }

    (environments, skipped)
}

/// Seed for the cloud at `position`; its instances add their deployment index
fn environment_seed(base: u64, position: usize) -> u64 {
    base.wrapping_add((position as u64) << 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryPublisher;
    use crate::config::{CloudConfig, MetricSpec, MetricsConfig, ServiceConfig};
    use crate::domain::ports::MetricsPublisher;
    use assert_matches::assert_matches;
    use std::net::SocketAddr;

    fn memory_factory() -> Arc<dyn PublisherFactory> {
        Arc::new(|cloud: &str, _addr: SocketAddr| -> Arc<dyn MetricsPublisher> {
            Arc::new(InMemoryPublisher::new(cloud))
        })
    }

    fn config(clouds: Vec<CloudConfig>) -> SimulatorConfig {
        SimulatorConfig {
            clouds,
            microservices: vec![
                ServiceConfig::new(
                    "auth",
                    MetricsConfig {
                        meters: vec![MetricSpec::new("logins", 1, 10)],
                        timers: vec![],
                    },
                ),
                ServiceConfig::new(
                    "billing",
                    MetricsConfig {
                        meters: vec![MetricSpec::new("logins", 1, 10)],
                        timers: vec![MetricSpec::new("charge", 0, 2)],
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_environment_seeds_differ_by_position() {
        assert_ne!(environment_seed(7, 0), environment_seed(7, 1));
        assert_eq!(environment_seed(7, 0), 7);
        assert_eq!(environment_seed(u64::MAX, 1), (1u64 << 32) - 1);
    }

    #[tokio::test]
    async fn test_build_deploys_all_to_all() {
        let config = config(vec![
            CloudConfig::new("prod", "127.0.0.1:2003"),
            CloudConfig::new("staging", "127.0.0.1:2004"),
        ]);
        let factory = memory_factory();

        let (envs, skipped) =
            build_environments(&config, &SimulatorSettings::default(), factory.as_ref()).await;

        assert!(skipped.is_empty());
        assert_eq!(envs.len(), 2);
        for env in &envs {
            let names: Vec<&str> = env.services().iter().map(|s| s.name()).collect();
            assert_eq!(names, vec!["auth", "billing"]);
        }
    }

    #[tokio::test]
    async fn test_unresolvable_cloud_skipped() {
        let config = config(vec![
            CloudConfig::new("prod", "127.0.0.1:2003"),
            CloudConfig::new("broken", "missing-port"),
        ]);
        let factory = memory_factory();

        let (envs, skipped) =
            build_environments(&config, &SimulatorSettings::default(), factory.as_ref()).await;

        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].name(), "prod");
        assert_eq!(skipped, vec!["broken".to_string()]);
    }

    #[tokio::test]
    async fn test_no_environments() {
        let config = config(vec![CloudConfig::new("broken", "missing-port")]);

        let result = run_with_factory(
            config,
            SimulatorSettings::default(),
            memory_factory(),
            CancellationToken::new(),
        )
        .await;

        assert_matches!(result, Err(Error::NoEnvironments));
    }

    #[tokio::test]
    async fn test_run_from_settings_missing_file() {
        let settings = SimulatorSettings {
            config_path: "/definitely/not/here.json".into(),
            ..Default::default()
        };

        let result = run_from_settings(settings, CancellationToken::new()).await;
        assert_matches!(result, Err(Error::ConfigRead { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_cancelled() {
        let config = config(vec![
            CloudConfig::new("prod", "127.0.0.1:2003"),
            CloudConfig::new("staging", "127.0.0.1:2004"),
        ]);
        let token = CancellationToken::new();

        let handle = tokio::spawn(run_with_factory(
            config,
            SimulatorSettings::default(),
            memory_factory(),
            token.clone(),
        ));
        tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
        token.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.environments.len(), 2);
        assert_eq!(summary.report("prod").unwrap().update_cycles, 3);
        assert_eq!(summary.total_update_cycles(), 6);
        assert!(summary.environments.iter().all(|r| r.final_flush_ok));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_log_publisher() {
        let config = config(vec![CloudConfig::new("prod", "127.0.0.1:2003")]);
        let settings = SimulatorSettings {
            publisher: PublisherKind::Log,
            ..Default::default()
        };
        let publisher = publisher_factory(&settings).create("prod", "127.0.0.1:2003".parse().unwrap());
        assert_eq!(publisher.endpoint(), "log");

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(config, settings, token.clone()));
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        token.cancel();

        let summary = handle.await.unwrap().unwrap();
        let report = summary.report("prod").unwrap();
        assert_eq!(report.update_cycles, 2);
        assert!(report.final_flush_ok);
    }
}
