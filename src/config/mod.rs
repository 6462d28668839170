//! Configuration
//!
//! The fleet description (clouds and microservices) loaded from a JSON or
//! YAML file, and the runtime settings supplied on the command line.

mod loader;
mod settings;
mod simulator;

pub use loader::{load_from_path, parse_str, ConfigFormat, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use settings::{
    DurationUnit, EnvironmentSettings, GraphiteSettings, PublisherKind, SimulatorSettings,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_PERCENTILES, DEFAULT_PUBLISH_TIMEOUT,
    DEFAULT_UPDATE_INTERVAL,
};
pub use simulator::{
    CloudConfig, MeterSpec, MetricSpec, MetricsConfig, SampleRange, ServiceConfig,
    SimulatorConfig, TimerSpec,
};
