//! Domain Ports (Port/Adapter Pattern)
//!
//! The metrics backend is an external collaborator: a cloud only knows how
//! to hand a registry snapshot to a [`MetricsPublisher`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │        MetricsPublisher │ PublisherFactory (Traits)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  GraphitePublisher │ LoggingPublisher │ InMemoryPublisher    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::RegistrySnapshot;

// =============================================================================
// Metrics Publisher Port
// =============================================================================

/// Port for publishing a full registry snapshot to a metrics backend.
///
/// A failed publish is transient: callers log it and try again on their
/// next schedule.
///
/// # Example Implementation
///
/// ```ignore
/// struct StdoutPublisher;
///
/// #[async_trait]
/// impl MetricsPublisher for StdoutPublisher {
///     async fn publish(&self, snapshot: &RegistrySnapshot) -> Result<()> {
///         println!("{} metrics", snapshot.len());
///         Ok(())
///     }
///
///     fn endpoint(&self) -> String {
///         "stdout".to_string()
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsPublisher: Send + Sync {
    /// Publish every metric in `snapshot`.
    async fn publish(&self, snapshot: &RegistrySnapshot) -> Result<()>;

    /// Human-readable backend address, used in logs.
    fn endpoint(&self) -> String;
}

// =============================================================================
// Publisher Factory Port
// =============================================================================

/// Builds the publisher for one cloud once its backend address is resolved.
pub trait PublisherFactory: Send + Sync {
    fn create(&self, cloud: &str, addr: SocketAddr) -> Arc<dyn MetricsPublisher>;
}

impl<F> PublisherFactory for F
where
    F: Fn(&str, SocketAddr) -> Arc<dyn MetricsPublisher> + Send + Sync,
{
    fn create(&self, cloud: &str, addr: SocketAddr) -> Arc<dyn MetricsPublisher> {
        self(cloud, addr)
    }
}

// =============================================================================
// Tests
// =============================================================================
