//! cluster
//!
//! Narrow interface to a cluster secret store.
//!
//! # Architecture
//!
//! Credentials for issue trackers may live as secrets in the cluster's
//! development namespace. Access goes through two traits so that no
//! module holds a process-wide client:
//!
//! - [`ClusterConnector`]: produces a client plus the current namespace
//! - [`ClusterClient`]: resolves the development namespace and lists secrets
//!
//! Connectors are injected into [`crate::auth::CredentialBootstrap`] per call.
//! [`Disconnected`] is used when no cluster is configured.
//!
//! # Example
//!
//! ```ignore
//! use tracklink::cluster::{ClusterConnector, Disconnected};
//!
//! let connector = Disconnected;
//! assert!(connector.connect().is_err());
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors from cluster access.
///
/// Errors are `Clone + PartialEq` so callers can check that a degraded
/// credential store reports the exact upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// No cluster is configured for this invocation.
    #[error("no cluster connection is configured")]
    Unavailable,

    /// The cluster client could not be created.
    #[error("failed to create a cluster client: {0}")]
    Client(String),

    /// The development namespace could not be determined.
    #[error("failed to get the development namespace from '{namespace}': {message}")]
    Namespace {
        /// The namespace the lookup started from
        namespace: String,
        /// Description of the failure
        message: String,
    },

    /// Listing secrets failed.
    #[error("failed to query secrets in the development namespace '{namespace}': {message}")]
    ListSecrets {
        /// The namespace that was queried
        namespace: String,
        /// Description of the failure
        message: String,
    },
}

/// A secret record read from the cluster.
///
/// Data values are already decoded. Secret values must never be logged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClusterSecret {
    /// Secret name
    pub name: String,
    /// Labels used to select credential secrets
    pub labels: BTreeMap<String, String>,
    /// Annotations carrying server metadata
    pub annotations: BTreeMap<String, String>,
    /// Decoded secret data
    pub data: BTreeMap<String, Vec<u8>>,
}

impl ClusterSecret {
    /// Create an empty secret with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Get a data entry as UTF-8, trimmed.
    ///
    /// Returns `None` if the key is missing, empty, or not valid UTF-8.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// Custom Debug to avoid exposing secret data
impl std::fmt::Debug for ClusterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterSecret")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("annotations", &self.annotations)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A connected cluster client.
pub trait ClusterClient: Send + Sync {
    /// Resolve the development namespace, starting from the current namespace.
    fn dev_namespace(&self, current: &str) -> Result<String, ClusterError>;

    /// List all secrets in a namespace.
    fn list_secrets(&self, namespace: &str) -> Result<Vec<ClusterSecret>, ClusterError>;
}

/// Produces a cluster client and the current namespace.
pub trait ClusterConnector: Send + Sync {
    /// Connect to the cluster.
    ///
    /// Returns the client together with the namespace it is scoped to.
    fn connect(&self) -> Result<(Box<dyn ClusterClient>, String), ClusterError>;
}

/// Connector used when no cluster is available.
///
/// Always fails with [`ClusterError::Unavailable`], which makes the
/// credential bootstrap fall back to local credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl ClusterConnector for Disconnected {
    fn connect(&self) -> Result<(Box<dyn ClusterClient>, String), ClusterError> {
        Err(ClusterError::Unavailable)
    }
}
