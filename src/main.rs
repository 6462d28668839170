//! Service Metrics Simulator
//!
//! Loads the fleet configuration, starts one environment per cloud and runs
//! until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use service_metrics_simulator::config::{
    load_from_path, DurationUnit, EnvironmentSettings, GraphiteSettings, PublisherKind,
    SimulatorSettings, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
use service_metrics_simulator::error::Result;
use service_metrics_simulator::simulator;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Service Metrics Simulator - synthetic microservice metrics for Graphite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the fleet configuration file (JSON, or YAML by extension)
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Interval between metric update cycles in milliseconds
    #[arg(long, env = "SIMULATOR_UPDATE_INTERVAL_MS", default_value = "1000")]
    update_interval_ms: u64,

    /// Interval between flushes to Graphite in milliseconds
    #[arg(long, env = "SIMULATOR_FLUSH_INTERVAL_MS", default_value = "10000")]
    flush_interval_ms: u64,

    /// Prefix prepended to every Graphite metric path
    #[arg(long, env = "SIMULATOR_GRAPHITE_PREFIX", default_value = "")]
    graphite_prefix: String,

    /// Timer percentiles to publish
    #[arg(
        long,
        env = "SIMULATOR_PERCENTILES",
        value_delimiter = ',',
        default_value = "0.5,0.75,0.95,0.99,0.999"
    )]
    percentiles: Vec<f64>,

    /// Unit of published timer values
    #[arg(long, env = "SIMULATOR_DURATION_UNIT", value_enum, default_value_t = DurationUnit::Nanoseconds)]
    duration_unit: DurationUnit,

    /// Bound on connect + write of one publish in milliseconds
    #[arg(long, env = "SIMULATOR_PUBLISH_TIMEOUT_MS", default_value = "5000")]
    publish_timeout_ms: u64,

    /// Where snapshots are published (graphite, log)
    #[arg(long, env = "SIMULATOR_PUBLISHER", value_enum, default_value_t = PublisherKind::Graphite)]
    publisher: PublisherKind,

    /// Base seed for metric sampling (OS entropy when absent)
    #[arg(long, env = "SIMULATOR_SEED")]
    seed: Option<u64>,

    /// Load and validate the configuration, then exit
    #[arg(long, env = "SIMULATOR_CHECK_CONFIG")]
    check_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn settings(&self) -> SimulatorSettings {
        SimulatorSettings {
            config_path: self.config.clone(),
            environment: EnvironmentSettings {
                update_interval: Duration::from_millis(self.update_interval_ms),
                flush_interval: Duration::from_millis(self.flush_interval_ms),
            },
            graphite: GraphiteSettings {
                prefix: self.graphite_prefix.clone(),
                percentiles: self.percentiles.clone(),
                duration_unit: self.duration_unit,
                timeout: Duration::from_millis(self.publish_timeout_ms),
            },
            publisher: self.publisher,
            seed: self.seed,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulator failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = args.settings();
    settings.validate()?;

    info!("Starting Service Metrics Simulator");
    info!("  Config: {}", settings.config_path.display());
    info!("  Update interval: {:?}", settings.environment.update_interval);
    info!("  Flush interval: {:?}", settings.environment.flush_interval);
    info!("  Duration unit: {}", settings.graphite.duration_unit);
    info!("  Publisher: {:?}", settings.publisher);

    let config = load_from_path(&settings.config_path)?;
    if args.check_config {
        info!(
            clouds = config.clouds.len(),
            microservices = config.microservices.len(),
            "Configuration is valid"
        );
        return Ok(());
    }

    let token = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(token.clone()));

    let summary = simulator::run(config, settings, token).await?;
    for report in &summary.environments {
        info!(
            cloud = %report.name,
            update_cycles = report.update_cycles,
            flush_failures = report.flush_failures,
            final_flush_ok = report.final_flush_ok,
            "Cloud summary"
        );
    }

    info!("Simulator shutdown complete");
    Ok(())
}

// =============================================================================
// Signals
// =============================================================================

async fn shutdown_on_signal(token: CancellationToken) {
    wait_for_signal().await;
    info!("Shutdown signal received");
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
