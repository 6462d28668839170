//! Simulated clouds
//!
//! Each cloud is an [`Environment`]: an isolated metrics registry, the
//! service instances deployed into it, and the backend it publishes to.

mod environment;

pub use environment::{resolve_endpoint, Environment, EnvironmentReport, LifecycleState};
