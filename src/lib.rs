//! Service Metrics Simulator
//!
//! Simulates a fleet of microservices deployed across several clouds. Every
//! service produces randomized meter and timer readings on a fixed cadence,
//! and each cloud periodically ships its metrics to its own Graphite
//! instance, so dashboards and alerting can be exercised without real
//! traffic.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator → Environment (per cloud) → ServiceInstance → Registry
//!                      │
//!                      └── flush → MetricsPublisher (Graphite)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Publisher implementations (Graphite, logging, in-memory)
//! - [`cloud`] - Per-cloud environment and its update/flush loops
//! - [`config`] - Fleet configuration file and runtime settings
//! - [`domain`] - Ports the environments depend on
//! - [`error`] - Error types
//! - [`microservice`] - Sample generation and service instances
//! - [`registry`] - Meters, timers and the namespaced registry
//! - [`simulator`] - Orchestrator wiring everything together

pub mod adapters;
pub mod cloud;
pub mod config;
pub mod domain;
pub mod error;
pub mod microservice;
pub mod registry;
pub mod simulator;

// Re-export commonly used types
pub use cloud::{Environment, EnvironmentReport, LifecycleState};
pub use config::{SimulatorConfig, SimulatorSettings};
pub use error::{Error, Result};
pub use registry::Registry;
pub use simulator::RunSummary;
