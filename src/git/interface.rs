//! git::interface
//!
//! Git metadata discovery using git2.
//!
//! This module is the single doorway to libgit2. No other module should
//! import `git2` directly. It answers two questions for the resolver:
//!
//! - where is the enclosing repository for a directory ([`GitMetadata::find_git_dir`])
//! - which remote URL is the upstream ([`GitMetadata::discover_upstream_url`])
//!
//! # Example
//!
//! ```ignore
//! use tracklink::git::{Git2Metadata, GitMetadata};
//! use std::path::Path;
//!
//! if let Some(location) = Git2Metadata.find_git_dir(Path::new("."))? {
//!     let url = Git2Metadata.discover_upstream_url(&location)?;
//!     println!("upstream is {}", url);
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Remote names tried, in order, when looking for the upstream URL.
pub const UPSTREAM_REMOTE_PREFERENCE: &[&str] = &["upstream", "origin"];

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository has no remote with a URL.
    #[error("no git remote with a URL is configured in {path}")]
    NoRemote {
        /// The git directory that was inspected
        path: PathBuf,
    },

    /// Permission or filesystem error.
    #[error("repository access error at {path}: {message}")]
    AccessError {
        /// The path being accessed
        path: PathBuf,
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with the path under inspection.
    fn from_git2(err: git2::Error, path: &Path) -> Self {
        match err.class() {
            git2::ErrorClass::Os | git2::ErrorClass::Filesystem => GitError::AccessError {
                path: path.to_path_buf(),
                message: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", path.display(), err.message()),
            },
        }
    }
}

/// Location of an enclosing git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLocation {
    /// Root of the working tree (the git dir itself for bare repositories)
    pub work_dir: PathBuf,
    /// The `.git` metadata directory
    pub git_dir: PathBuf,
}

impl GitLocation {
    /// Path of the repository config file.
    pub fn config_file(&self) -> PathBuf {
        self.git_dir.join("config")
    }
}

/// Git metadata queries used by the resolver.
pub trait GitMetadata: Send + Sync {
    /// Find the repository enclosing `dir`.
    ///
    /// Returns `Ok(None)` when `dir` is not inside a repository.
    fn find_git_dir(&self, dir: &Path) -> Result<Option<GitLocation>, GitError>;

    /// Discover the upstream remote URL of a repository.
    ///
    /// Prefers the `upstream` remote, then `origin`, then the first remote
    /// that has a URL.
    fn discover_upstream_url(&self, location: &GitLocation) -> Result<String, GitError>;
}

/// [`GitMetadata`] backed by libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Metadata;

impl GitMetadata for Git2Metadata {
    fn find_git_dir(&self, dir: &Path) -> Result<Option<GitLocation>, GitError> {
        let repo = match git2::Repository::discover(dir) {
            Ok(repo) => repo,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, dir)),
        };

        let git_dir = repo.path().to_path_buf();
        let work_dir = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| git_dir.clone());

        Ok(Some(GitLocation { work_dir, git_dir }))
    }

    fn discover_upstream_url(&self, location: &GitLocation) -> Result<String, GitError> {
        let repo = git2::Repository::open(&location.git_dir)
            .map_err(|e| GitError::from_git2(e, &location.git_dir))?;

        for name in UPSTREAM_REMOTE_PREFERENCE {
            if let Some(url) = remote_url(&repo, name, &location.git_dir)? {
                return Ok(url);
            }
        }

        let remotes = repo
            .remotes()
            .map_err(|e| GitError::from_git2(e, &location.git_dir))?;
        for name in remotes.iter().flatten() {
            if let Some(url) = remote_url(&repo, name, &location.git_dir)? {
                return Ok(url);
            }
        }

        Err(GitError::NoRemote {
            path: location.git_dir.clone(),
        })
    }
}

/// Get the URL for a remote.
///
/// Returns `None` if the remote doesn't exist or has no URL.
fn remote_url(repo: &git2::Repository, name: &str, path: &Path) -> Result<Option<String>, GitError> {
    match repo.find_remote(name) {
        Ok(remote) => Ok(remote
            .url()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) if e.class() == git2::ErrorClass::Config => Ok(None),
        Err(e) => Err(GitError::from_git2(e, path)),
    }
}
