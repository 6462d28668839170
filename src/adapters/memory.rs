//! In-Memory Publisher Adapter
//!
//! Collects published snapshots in memory for later inspection. Failures
//! can be injected to exercise the transient-error path.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ports::MetricsPublisher;
use crate::error::{Error, Result};
use crate::registry::RegistrySnapshot;

/// Records every publish attempt; successful ones keep their snapshot
#[derive(Debug)]
pub struct InMemoryPublisher {
    endpoint: String,
    snapshots: Mutex<Vec<RegistrySnapshot>>,
    attempts: Mutex<usize>,
    /// Scripted outcomes, consumed one per attempt (`true` = fail)
    script: Mutex<VecDeque<bool>>,
    fail_always: Mutex<bool>,
}

impl InMemoryPublisher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            snapshots: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            script: Mutex::new(VecDeque::new()),
            fail_always: Mutex::new(false),
        }
    }

    /// Publisher whose every attempt fails
    pub fn failing(endpoint: impl Into<String>) -> Self {
        let publisher = Self::new(endpoint);
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_always.lock() = failing;
    }

    /// Fail the next `n` attempts, then fall back to the default behaviour
    pub fn fail_next(&self, n: usize) {
        self.script.lock().extend(std::iter::repeat(true).take(n));
    }

    /// Snapshots published successfully, oldest first
    pub fn snapshots(&self) -> Vec<RegistrySnapshot> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<RegistrySnapshot> {
        self.snapshots.lock().last().cloned()
    }

    /// Successful publishes
    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }

    /// All publish attempts, failed ones included
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl MetricsPublisher for InMemoryPublisher {
    async fn publish(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        *self.attempts.lock() += 1;

        let scripted = self.script.lock().pop_front();
        let fail = scripted.unwrap_or_else(|| *self.fail_always.lock());
        if fail {
            return Err(Error::Publish {
                endpoint: self.endpoint.clone(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "injected failure"),
            });
        }

        self.snapshots.lock().push(snapshot.clone());
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_in_memory_collector() {
        let publisher = InMemoryPublisher::new("memory");
        assert!(publisher.is_empty());

        let registry = Registry::new();
        registry.meter("a").mark(1);
        publisher.publish(&registry.snapshot()).await.unwrap();
        registry.meter("b").mark(1);
        publisher.publish(&registry.snapshot()).await.unwrap();

        assert_eq!(publisher.len(), 2);
        assert_eq!(publisher.attempts(), 2);
        assert_eq!(publisher.last().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let publisher = InMemoryPublisher::new("memory");
        publisher.fail_next(2);
        let snapshot = Registry::new().snapshot();

        assert_err!(publisher.publish(&snapshot).await);
        assert_err!(publisher.publish(&snapshot).await);
        assert_ok!(publisher.publish(&snapshot).await);
        assert_eq!(publisher.attempts(), 3);
        assert_eq!(publisher.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_publisher() {
        let publisher = InMemoryPublisher::failing("memory");
        let snapshot = Registry::new().snapshot();
        assert_err!(publisher.publish(&snapshot).await);

        publisher.set_failing(false);
        assert_ok!(publisher.publish(&snapshot).await);
    }
}
