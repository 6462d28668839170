//! Infrastructure Adapters
//!
//! Adapter implementations for the domain ports, following the
//! Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │           MetricsPublisher │ PublisherFactory (Traits)           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │   GraphitePublisher │ LoggingPublisher │ InMemoryPublisher       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use service_metrics_simulator::adapters::GraphitePublisher;
//! use service_metrics_simulator::domain::ports::MetricsPublisher;
//!
//! let publisher = GraphitePublisher::new(addr, GraphiteSettings::default());
//! publisher.publish(&registry.snapshot()).await?;
//! ```

mod graphite;
mod logging;
mod memory;

pub use graphite::{format_snapshot, percentile_key, GraphitePublisher, GraphitePublisherFactory};
pub use logging::{LoggingPublisher, LoggingPublisherFactory};
pub use memory::InMemoryPublisher;
