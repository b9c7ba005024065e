//! resolve::fallback
//!
//! Upstream URL discovery plus URL parsing for the git fallback path.
//! The two steps keep distinct error identities: a missing remote means the
//! project is not set up, a malformed URL is a defect.

use thiserror::Error;
use tracing::debug;

use crate::git::{parse_git_url, GitError, GitLocation, GitMetadata, GitRepositoryInfo, GitUrlError};

/// Errors from git fallback discovery.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// No upstream remote URL could be found.
    #[error(transparent)]
    UpstreamUrl(GitError),

    /// The upstream URL could not be parsed.
    #[error(transparent)]
    Parse(GitUrlError),
}

/// Discovers the repository identity behind a git location.
pub struct GitFallbackDiscovery;

impl GitFallbackDiscovery {
    /// Discover the upstream URL of `location` and parse it.
    ///
    /// Returns the raw URL together with the parsed identity.
    pub fn discover(
        git: &dyn GitMetadata,
        location: &GitLocation,
    ) -> Result<(String, GitRepositoryInfo), FallbackError> {
        let url = git
            .discover_upstream_url(location)
            .map_err(FallbackError::UpstreamUrl)?;
        debug!(url = %url, git_dir = %location.git_dir.display(), "discovered upstream URL");
        let info = parse_git_url(&url).map_err(FallbackError::Parse)?;
        Ok((url, info))
    }
}
