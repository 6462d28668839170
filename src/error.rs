//! Error types for the Service Metrics Simulator

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Service Metrics Simulator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors (fatal)
    // =========================================================================
    /// Configuration file could not be opened or read
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be decoded
    #[error("Failed to decode configuration file {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    /// Configuration decoded but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid runtime settings (CLI / environment)
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // =========================================================================
    // Environment Errors (per cloud)
    // =========================================================================
    /// Backend endpoint could not be resolved to a TCP address
    #[error("Failed to resolve graphite endpoint '{endpoint}': {reason}")]
    EndpointResolution { endpoint: String, reason: String },

    /// No environment survived construction
    #[error("No valid cloud configurations")]
    NoEnvironments,

    // =========================================================================
    // Publish Errors (transient)
    // =========================================================================
    /// Publishing a snapshot to the backend failed
    #[error("Failed to publish metrics to {endpoint}: {source}")]
    Publish {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Publishing a snapshot to the backend did not complete in time
    #[error("Publishing metrics to {endpoint} timed out after {timeout:?}")]
    PublishTimeout { endpoint: String, timeout: Duration },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that abort the whole process rather than one cloud or one flush
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::InvalidConfig(_)
                | Error::InvalidSettings(_)
                | Error::NoEnvironments
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::NoEnvironments.is_fatal());
        assert!(Error::InvalidConfig("low >= high".into()).is_fatal());
        assert!(!Error::EndpointResolution {
            endpoint: "nope".into(),
            reason: "invalid socket address".into(),
        }
        .is_fatal());
        assert!(!Error::PublishTimeout {
            endpoint: "127.0.0.1:2003".into(),
            timeout: Duration::from_secs(5),
        }
        .is_fatal());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::EndpointResolution {
            endpoint: "bad endpoint".into(),
            reason: "invalid port value".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bad endpoint"));
        assert!(msg.contains("invalid port value"));
    }
}
