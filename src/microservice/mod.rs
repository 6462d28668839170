//! Microservice simulation
//!
//! Provides the per-service sample generator and the service instances a
//! cloud updates on every tick.

mod generator;
mod instance;

pub use generator::MetricGenerator;
pub use instance::{ServiceInstance, METER_PREFIX, TIMER_PREFIX};
