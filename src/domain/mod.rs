//! Domain Layer
//!
//! Trait abstractions (ports) for the collaborators a cloud depends on.
//! Adapters in [`crate::adapters`] provide the concrete implementations.
//!
//! # Usage
//!
//! ```ignore
//! use service_metrics_simulator::domain::ports::MetricsPublisher;
//! use service_metrics_simulator::registry::Registry;
//!
//! async fn flush<P: MetricsPublisher>(publisher: &P, registry: &Registry) -> Result<()> {
//!     publisher.publish(&registry.snapshot()).await
//! }
//! ```

pub mod ports;

pub use ports::{MetricsPublisher, PublisherFactory};
