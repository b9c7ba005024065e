//! resolve::error
//!
//! Errors from issue provider resolution.
//!
//! Every fatal path renders as a single message naming the directory or URL
//! under inspection. Configuration failures and URL parse failures keep
//! their own variants so callers can tell "nothing is set up" apart from
//! "something is set up wrong".

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::BootstrapError;
use crate::auth::AuthError;
use crate::core::config::ConfigError;
use crate::git::{GitError, GitUrlError};
use crate::issues::IssueError;

/// Why no issue tracker could be derived from git.
#[derive(Debug, Error)]
pub enum MissingSetup {
    /// `dir` is not inside a git repository.
    #[error("no git directory could be found")]
    NoGitDirectory,

    /// The repository has no usable upstream remote.
    #[error("could not find the upstream git URL: {0}")]
    UpstreamUrl(#[source] GitError),
}

/// Errors from [`IssueProviderResolver::resolve`](super::IssueProviderResolver::resolve).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A project config file exists but cannot be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No credential store could be built.
    #[error("cannot load issue tracker credentials")]
    CredentialStore(#[source] BootstrapError),

    /// No user credential could be chosen for the tracker server.
    #[error("cannot select credentials for {url}")]
    Credentials {
        /// The tracker URL
        url: String,
        /// The selection failure
        #[source]
        source: AuthError,
    },

    /// The provider could not be constructed.
    #[error(transparent)]
    Provider(#[from] IssueError),

    /// No tracker is configured and git discovery could not stand in.
    #[error("{}", no_tracker_message(.dir, .cause))]
    NoIssueTrackerConfigured {
        /// The directory resolution started from
        dir: PathBuf,
        /// What was missing; already part of the message
        cause: MissingSetup,
    },

    /// The upstream git URL could not be parsed.
    #[error(transparent)]
    GitUrl(#[from] GitUrlError),
}

impl ResolveError {
    /// Whether the failure means nothing is set up, rather than misconfigured.
    pub fn is_no_tracker_configured(&self) -> bool {
        matches!(self, ResolveError::NoIssueTrackerConfigured { .. })
    }
}

fn no_tracker_message(dir: &std::path::Path, cause: &MissingSetup) -> String {
    match cause {
        MissingSetup::NoGitDirectory => format!(
            "No issue tracker configured and no git directory could be found from dir {}",
            dir.display()
        ),
        MissingSetup::UpstreamUrl(e) => format!(
            "No issue tracker configured and could not find the upstream git URL for dir {}: {}",
            dir.display(),
            e
        ),
    }
}
