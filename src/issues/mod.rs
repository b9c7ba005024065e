//! issues
//!
//! Abstraction over remote issue trackers (Jira, GitHub).
//!
//! # Architecture
//!
//! The `IssueProvider` trait defines the operations commands need. Providers
//! are created through an [`IssueProviderFactory`] so the resolver never
//! names a concrete implementation.
//!
//! # Modules
//!
//! - `traits`: `IssueProvider` trait and issue types
//! - [`jira`]: Jira REST v2 implementation
//! - [`github`]: GitHub REST v3 implementation
//! - [`mock`]: in-memory implementation for deterministic testing
//! - `factory`: kind parsing, git hosting detection and provider creation

mod factory;
pub mod github;
pub mod jira;
pub mod mock;
mod traits;

pub use factory::{
    DefaultIssueProviderFactory, GitHostingClient, IssueProviderFactory, IssueTrackerKind,
    GITHUB_TOKEN_ENV,
};
pub use traits::*;
