//! resolve::resolver
//!
//! Decides which issue tracker serves a project directory.
//!
//! # Algorithm
//!
//! 1. Load the project config at `dir`; errors are fatal.
//! 2. If it exists but has no `[issue_tracker]` table, load the config at
//!    the enclosing git work tree instead; errors are fatal.
//! 3. A configured tracker (kind and URL set) is used with credentials from
//!    the credential store. Its outcome is final; git is never consulted.
//! 4. Otherwise the upstream remote of the enclosing repository names a git
//!    hosting service whose issues are used.
//!
//! The enclosing repository is looked up at most once, and only when one
//! of steps 2 or 4 needs it. A lookup error counts as "no repository" and
//! is reported only if the git path is reached.

use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::error::{MissingSetup, ResolveError};
use super::fallback::{FallbackError, GitFallbackDiscovery};
use crate::auth::{AuthConfigService, BootstrapOutcome, CredentialBootstrap, CredentialStoreBuilder};
use crate::cluster::ClusterConnector;
use crate::core::config::{IssueTrackerConfig, LoadedProjectConfig, ProjectConfig};
use crate::git::{GitLocation, GitMetadata};
use crate::issues::{IssueError, IssueProvider, IssueProviderFactory};
use crate::ui::prompts::Prompter;

/// Prompt shown when picking credentials for a configured tracker.
pub const TRACKER_USER_PROMPT: &str = "user to access the issue tracker";

/// Prompt shown when picking credentials for the git hosting service.
pub const GIT_USER_PROMPT: &str = "user name to use for authenticating with git issues";

/// Resolves the issue provider for a project directory.
///
/// All collaborators are injected; the resolver keeps no state between
/// calls, so one instance may serve concurrent resolutions.
#[derive(Clone)]
pub struct IssueProviderResolver {
    cluster: Arc<dyn ClusterConnector>,
    store: Arc<dyn CredentialStoreBuilder>,
    git: Arc<dyn GitMetadata>,
    factory: Arc<dyn IssueProviderFactory>,
    prompter: Arc<dyn Prompter>,
}

impl IssueProviderResolver {
    /// Create a resolver over its collaborators.
    pub fn new(
        cluster: Arc<dyn ClusterConnector>,
        store: Arc<dyn CredentialStoreBuilder>,
        git: Arc<dyn GitMetadata>,
        factory: Arc<dyn IssueProviderFactory>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            cluster,
            store,
            git,
            factory,
            prompter,
        }
    }

    /// Build a credential store handle, using cluster secrets when reachable.
    ///
    /// See [`CredentialBootstrap`] for the degraded outcome.
    pub fn bootstrap_credential_store(&self) -> BootstrapOutcome {
        CredentialBootstrap::new(self.cluster.as_ref(), self.store.as_ref()).bootstrap()
    }

    /// Resolve the issue provider for `dir`.
    pub fn resolve(&self, dir: &Path) -> Result<Box<dyn IssueProvider>, ResolveError> {
        let git_location = OnceCell::new();
        let locate = || git_location.get_or_init(|| self.locate_git(dir)).as_ref();

        let mut loaded = ProjectConfig::load(dir)?;
        if let Some(config) = &loaded {
            debug!(path = %config.path.display(), "loaded project config");
        }

        if loaded
            .as_ref()
            .map_or(false, |l| l.config.issue_tracker.is_none())
        {
            if let Some(location) = locate() {
                if !same_dir(&location.work_dir, dir) {
                    debug!(
                        work_dir = %location.work_dir.display(),
                        "no issue tracker section; loading config at the git work tree"
                    );
                    loaded = ProjectConfig::load(&location.work_dir)?;
                }
            }
        }

        if let Some(tracker) = configured_tracker(&loaded) {
            debug!(kind = %tracker.kind, url = %tracker.url, "using configured issue tracker");
            return self.resolve_configured(tracker);
        }

        let location = locate().ok_or_else(|| ResolveError::NoIssueTrackerConfigured {
            dir: dir.to_path_buf(),
            cause: MissingSetup::NoGitDirectory,
        })?;
        self.resolve_git_hosting(dir, location)
    }

    /// Build the provider for an explicitly configured tracker.
    fn resolve_configured(
        &self,
        tracker: &IssueTrackerConfig,
    ) -> Result<Box<dyn IssueProvider>, ResolveError> {
        let mut service = self.credential_handle()?;
        let config = service.config_mut();
        let server = config.get_or_create_server(&tracker.url).clone();
        let user = config
            .pick_server_user_auth(&server, TRACKER_USER_PROMPT, self.prompter.as_ref())
            .map_err(|source| ResolveError::Credentials {
                url: tracker.url.clone(),
                source,
            })?;
        debug!(server = %server.url, user = %user.username, "selected tracker credentials");

        let provider =
            self.factory
                .create_issue_provider(&tracker.kind, &server, &user, &tracker.project)?;
        debug!(kind = provider.kind(), "created issue provider");
        Ok(provider)
    }

    /// Build the provider from the repository's git hosting service.
    fn resolve_git_hosting(
        &self,
        dir: &Path,
        location: &GitLocation,
    ) -> Result<Box<dyn IssueProvider>, ResolveError> {
        debug!(work_dir = %location.work_dir.display(), "no issue tracker configured; using git hosting");
        let (url, info) =
            GitFallbackDiscovery::discover(self.git.as_ref(), location).map_err(|e| match e {
                FallbackError::UpstreamUrl(source) => ResolveError::NoIssueTrackerConfigured {
                    dir: dir.to_path_buf(),
                    cause: MissingSetup::UpstreamUrl(source),
                },
                FallbackError::Parse(source) => ResolveError::GitUrl(source),
            })?;

        let client = self
            .factory
            .resolve_git_hosting(&url, GIT_USER_PROMPT, self.prompter.as_ref())
            .map_err(|e| match e {
                IssueError::Credentials(source) => ResolveError::Credentials {
                    url: url.clone(),
                    source,
                },
                other => ResolveError::Provider(other),
            })?;
        debug!(kind = %client.kind, server = %client.server_url, repo = %info.full_name(), "resolved git hosting client");

        let provider = self
            .factory
            .create_git_issue_provider(client, &info.organisation, &info.name)?;
        Ok(provider)
    }

    /// Credential handle for the configured path; a degraded handle is accepted.
    fn credential_handle(&self) -> Result<AuthConfigService, ResolveError> {
        match self.bootstrap_credential_store().into_parts() {
            (Some(handle), None) => Ok(handle),
            (Some(handle), Some(error)) => {
                debug!(error = %error, "continuing with degraded credential store");
                Ok(handle)
            }
            (None, Some(error)) => Err(ResolveError::CredentialStore(error)),
            (None, None) => Ok(AuthConfigService::default()),
        }
    }

    /// Look up the enclosing repository; errors count as "none".
    fn locate_git(&self, dir: &Path) -> Option<GitLocation> {
        match self.git.find_git_dir(dir) {
            Ok(location) => location,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "git directory lookup failed");
                None
            }
        }
    }
}

fn configured_tracker(loaded: &Option<LoadedProjectConfig>) -> Option<&IssueTrackerConfig> {
    loaded.as_ref().and_then(|l| l.config.configured_tracker())
}

/// Compare directories, resolving symlinks when possible.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
