//! auth::bootstrap
//!
//! Credential store bootstrap from the cluster secret store.
//!
//! # Failure policy
//!
//! The bootstrap connects to the cluster, resolves the development
//! namespace and lists its secrets. If any of those steps fails, the store
//! is built once more without secrets. When that retry succeeds, the
//! outcome carries **both** the degraded handle and the original cluster
//! error, so a caller that only needs best-effort credentials can proceed
//! while a caller that checks the error still sees the root cause.
//!
//! Because a plain `Result` cannot hold both, the outcome is the named
//! struct [`BootstrapOutcome`].
//!
//! # Example
//!
//! ```ignore
//! use tracklink::auth::{CredentialBootstrap, LocalCredentialStore};
//! use tracklink::cluster::Disconnected;
//!
//! let store = LocalCredentialStore::new(None);
//! let outcome = CredentialBootstrap::new(&Disconnected, &store).bootstrap();
//! assert!(outcome.handle.is_some()); // degraded, but usable
//! assert!(outcome.error.is_some()); // cluster unavailable
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use super::errors::AuthError;
use super::store::{AuthConfigService, CredentialStoreBuilder};
use crate::cluster::{ClusterConnector, ClusterError, ClusterSecret};

/// Errors from the credential bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Cluster access failed; reported unchanged.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// The credential store could not be built.
    #[error(transparent)]
    Store(#[from] AuthError),
}

/// Result of a credential bootstrap.
///
/// Unlike a `Result`, both fields may be set at once: a degraded handle
/// built without cluster secrets alongside the cluster error that caused
/// the degradation.
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// The credential store handle, if one could be built.
    pub handle: Option<AuthConfigService>,
    /// The first failure encountered, if any.
    pub error: Option<BootstrapError>,
}

impl BootstrapOutcome {
    fn ok(handle: AuthConfigService) -> Self {
        Self {
            handle: Some(handle),
            error: None,
        }
    }

    fn failed(error: BootstrapError) -> Self {
        Self {
            handle: None,
            error: Some(error),
        }
    }

    /// A usable handle was produced despite an error.
    pub fn is_degraded(&self) -> bool {
        self.handle.is_some() && self.error.is_some()
    }

    /// Strict view: any error wins over the handle.
    pub fn into_result(self) -> Result<AuthConfigService, BootstrapError> {
        match (self.handle, self.error) {
            (_, Some(error)) => Err(error),
            (Some(handle), None) => Ok(handle),
            // Unreachable by construction; treated as an empty store.
            (None, None) => Ok(AuthConfigService::default()),
        }
    }

    /// Split into handle and error.
    pub fn into_parts(self) -> (Option<AuthConfigService>, Option<BootstrapError>) {
        (self.handle, self.error)
    }
}

/// Builds a credential store, pulling secrets from the cluster when possible.
pub struct CredentialBootstrap<'a> {
    connector: &'a dyn ClusterConnector,
    builder: &'a dyn CredentialStoreBuilder,
}

impl<'a> CredentialBootstrap<'a> {
    /// Create a bootstrap over the given cluster connector and store builder.
    pub fn new(
        connector: &'a dyn ClusterConnector,
        builder: &'a dyn CredentialStoreBuilder,
    ) -> Self {
        Self { connector, builder }
    }

    /// Run the bootstrap.
    pub fn bootstrap(&self) -> BootstrapOutcome {
        let secrets = match self.cluster_secrets() {
            Ok(secrets) => secrets,
            // No cluster at all is the usual case outside one
            Err(err @ ClusterError::Unavailable) => {
                debug!(error = %err, "no cluster; using local credentials only");
                return self.degraded(err);
            }
            Err(err) => {
                warn!(error = %err, "cannot read credentials from the cluster; using local credentials only");
                return self.degraded(err);
            }
        };

        match self.builder.build(Some(&secrets)) {
            Ok(handle) => BootstrapOutcome::ok(handle),
            Err(err) => BootstrapOutcome::failed(err.into()),
        }
    }

    /// Connect, resolve the development namespace and list its secrets.
    fn cluster_secrets(&self) -> Result<Vec<ClusterSecret>, ClusterError> {
        let (client, current) = self.connector.connect()?;
        let namespace = client.dev_namespace(&current)?;
        let secrets = client.list_secrets(&namespace)?;
        debug!(namespace = %namespace, count = secrets.len(), "listed cluster secrets");
        Ok(secrets)
    }

    /// Retry without secrets, keeping `parent` as the reported error.
    fn degraded(&self, parent: ClusterError) -> BootstrapOutcome {
        match self.builder.build(None) {
            Ok(handle) => BootstrapOutcome {
                handle: Some(handle),
                error: Some(BootstrapError::Cluster(parent)),
            },
            Err(err) => BootstrapOutcome::failed(err.into()),
        }
    }
}
