//! git
//!
//! Git metadata discovery and remote URL parsing.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module should import
//! `git2`. Callers depend on the [`GitMetadata`] trait so the resolver can be
//! exercised without real repositories.
//!
//! # Responsibilities
//!
//! - Repository discovery from any directory inside a work tree
//! - Upstream remote URL discovery (`upstream`, then `origin`, then any)
//! - Remote URL parsing into organisation and repository name
//!
//! # Example
//!
//! ```ignore
//! use tracklink::git::{parse_git_url, Git2Metadata, GitMetadata};
//! use std::path::Path;
//!
//! let location = Git2Metadata.find_git_dir(Path::new("."))?.expect("inside a repo");
//! let url = Git2Metadata.discover_upstream_url(&location)?;
//! let info = parse_git_url(&url)?;
//! println!("{} on {}", info.full_name(), info.host);
//! ```

mod interface;
mod url;

pub use interface::{Git2Metadata, GitError, GitLocation, GitMetadata, UPSTREAM_REMOTE_PREFERENCE};
pub use url::{parse_git_url, GitRepositoryInfo, GitUrlError};
