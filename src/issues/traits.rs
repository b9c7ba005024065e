//! issues::traits
//!
//! Issue provider trait and shared issue types.
//!
//! # Design
//!
//! The `IssueProvider` trait is async because every operation talks to a
//! remote tracker. Implementations are `Send + Sync` so a provider can be
//! shared across tasks.
//!
//! # Example
//!
//! ```ignore
//! use tracklink::issues::{CreateIssueRequest, IssueProvider};
//!
//! async fn file_bug(provider: &dyn IssueProvider) -> Result<(), IssueError> {
//!     let issue = provider
//!         .create_issue(CreateIssueRequest::new("Build is red"))
//!         .await?;
//!     println!("created {} at {}", issue.key, issue.url);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::AuthError;

/// Errors from issue provider operations.
#[derive(Debug, Clone, Error)]
pub enum IssueError {
    /// Authentication is required but no credentials are available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested issue or project was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The tracker kind is known but not supported yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The tracker kind is not recognised.
    #[error("unsupported issue tracker kind '{0}'")]
    UnsupportedKind(String),

    /// The project identifier is not valid for the tracker.
    #[error("invalid project '{project}': {message}")]
    InvalidProject {
        /// The configured project
        project: String,
        /// Why it was rejected
        message: String,
    },

    /// No credential could be read or chosen for the server.
    #[error("cannot select credentials")]
    Credentials(#[source] AuthError),
}

/// Issue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    /// Open, in progress or otherwise unresolved
    Open,
    /// Closed or resolved
    Closed,
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// An issue as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Tracker key (e.g., "ABC-12" for Jira, "42" for GitHub)
    pub key: String,
    /// Issue title / summary
    pub title: String,
    /// Issue description
    pub body: Option<String>,
    /// Web URL for viewing the issue
    pub url: String,
    /// Issue state
    pub state: IssueState,
    /// Labels
    pub labels: Vec<String>,
    /// Creation time, when reported
    pub created_at: Option<DateTime<Utc>>,
    /// Close time, when reported
    pub closed_at: Option<DateTime<Utc>>,
}

/// Request to create an issue.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueRequest {
    /// Issue title
    pub title: String,
    /// Issue description
    pub body: Option<String>,
    /// Labels to apply
    pub labels: Vec<String>,
}

impl CreateIssueRequest {
    /// Create a request with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Provider for issue operations against one tracker project.
///
/// # Error Handling
///
/// - `AuthRequired` / `AuthFailed`: credentials missing or rejected
/// - `NotFound`: issue or project does not exist
/// - `RateLimited`: back off and retry
/// - `ApiError` / `NetworkError`: report to the user
#[async_trait]
pub trait IssueProvider: Send + Sync {
    /// Tracker kind name (e.g., "jira", "github").
    fn kind(&self) -> &'static str;

    /// Fetch a single issue by key.
    async fn get_issue(&self, key: &str) -> Result<Issue, IssueError>;

    /// Search issues in the project.
    ///
    /// An empty query lists open issues. The query syntax is
    /// tracker-specific (JQL for Jira, search qualifiers for GitHub).
    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>, IssueError>;

    /// Issues closed at or after `since`.
    async fn search_issues_closed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>, IssueError>;

    /// Create an issue.
    async fn create_issue(&self, request: CreateIssueRequest) -> Result<Issue, IssueError>;

    /// Add a comment to an issue.
    async fn create_issue_comment(&self, key: &str, body: &str) -> Result<(), IssueError>;

    /// Web URL of an issue. No network access.
    fn issue_url(&self, key: &str) -> String;

    /// Web URL of the project's issue list. No network access.
    fn home_url(&self) -> String;
}
