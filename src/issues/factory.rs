//! issues::factory
//!
//! Issue provider selection and creation.
//!
//! # Design
//!
//! Commands and the resolver go through [`IssueProviderFactory`] instead of
//! constructing providers directly, so tests can substitute a factory that
//! hands out mocks.
//!
//! # Tracker kinds
//!
//! - `jira` → [`JiraIssueProvider`]
//! - `github` → [`GitHubIssueProvider`] (project `owner/repo`)
//! - `gitlab`, `bitbucket` → known, `IssueError::NotImplemented`
//!
//! # Git hosting detection
//!
//! - `github.com` → GitHub
//! - a server registered in the credentials file with kind `github` →
//!   GitHub Enterprise
//! - `gitlab.*` → `IssueError::NotImplemented`
//! - anything else → `IssueError::NotFound`

use std::sync::Arc;

use tracing::{debug, warn};

use super::github::{api_base_for, GitHubIssueProvider, GITHUB_URL};
use super::jira::JiraIssueProvider;
use super::traits::{IssueError, IssueProvider};
use crate::auth::{AuthConfig, AuthConfigService, AuthError, AuthServer, CredentialStoreBuilder, UserAuth};
use crate::git::parse_git_url;
use crate::ui::prompts::Prompter;

/// Environment variable holding a github.com token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Username recorded for credentials taken from `$GITHUB_TOKEN`.
const TOKEN_USERNAME: &str = "x-access-token";

/// Known issue tracker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTrackerKind {
    /// Atlassian Jira
    Jira,
    /// GitHub or GitHub Enterprise issues
    GitHub,
    /// GitLab issues (not implemented)
    GitLab,
    /// Bitbucket issues (not implemented)
    Bitbucket,
}

impl IssueTrackerKind {
    /// All known kinds.
    pub fn all() -> &'static [IssueTrackerKind] {
        &[
            IssueTrackerKind::Jira,
            IssueTrackerKind::GitHub,
            IssueTrackerKind::GitLab,
            IssueTrackerKind::Bitbucket,
        ]
    }

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            IssueTrackerKind::Jira => "jira",
            IssueTrackerKind::GitHub => "github",
            IssueTrackerKind::GitLab => "gitlab",
            IssueTrackerKind::Bitbucket => "bitbucket",
        }
    }

    /// Whether a provider exists for this kind.
    pub fn is_implemented(&self) -> bool {
        matches!(self, IssueTrackerKind::Jira | IssueTrackerKind::GitHub)
    }

    /// Parse a kind name (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use tracklink::issues::IssueTrackerKind;
    ///
    /// assert_eq!(IssueTrackerKind::parse("Jira").unwrap(), IssueTrackerKind::Jira);
    /// assert!(IssueTrackerKind::parse("trac").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, IssueError> {
        match s.trim().to_lowercase().as_str() {
            "jira" => Ok(IssueTrackerKind::Jira),
            "github" => Ok(IssueTrackerKind::GitHub),
            "gitlab" => Ok(IssueTrackerKind::GitLab),
            "bitbucket" | "bitbucketserver" | "bitbucketcloud" => Ok(IssueTrackerKind::Bitbucket),
            _ => Err(IssueError::UnsupportedKind(s.to_string())),
        }
    }

    fn not_implemented(&self) -> IssueError {
        IssueError::NotImplemented(format!("{} issue trackers are not supported yet", self.name()))
    }
}

impl std::fmt::Display for IssueTrackerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A git hosting service resolved from a remote URL, with credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct GitHostingClient {
    /// Hosting service kind
    pub kind: IssueTrackerKind,
    /// Web URL of the server (e.g., `https://github.com`)
    pub server_url: String,
    /// REST API base URL
    pub api_base: String,
    /// Credentials for the API
    pub user: UserAuth,
}

/// Creates issue providers for named trackers and git hosting services.
pub trait IssueProviderFactory: Send + Sync {
    /// Resolve the git hosting service for `git_url` and pick credentials,
    /// prompting with `message` when needed.
    fn resolve_git_hosting(
        &self,
        git_url: &str,
        message: &str,
        prompter: &dyn Prompter,
    ) -> Result<GitHostingClient, IssueError>;

    /// Create a provider for a named tracker.
    fn create_issue_provider(
        &self,
        kind: &str,
        server: &AuthServer,
        user: &UserAuth,
        project: &str,
    ) -> Result<Box<dyn IssueProvider>, IssueError>;

    /// Create a provider for a repository on a git hosting service.
    fn create_git_issue_provider(
        &self,
        client: GitHostingClient,
        organisation: &str,
        repo: &str,
    ) -> Result<Box<dyn IssueProvider>, IssueError>;
}

/// Factory building the real Jira and GitHub providers.
///
/// Git hosting credentials are read from `store` only when a git hosting
/// service is resolved, with `github_token` as a fallback for github.com.
#[derive(Clone)]
pub struct DefaultIssueProviderFactory {
    store: Arc<dyn CredentialStoreBuilder>,
    github_token: Option<String>,
}

// Custom Debug to avoid exposing github_token
impl std::fmt::Debug for DefaultIssueProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultIssueProviderFactory")
            .field("has_github_token", &self.github_token.is_some())
            .finish_non_exhaustive()
    }
}

impl DefaultIssueProviderFactory {
    /// Create a factory reading git hosting credentials from `store`.
    pub fn new(store: Arc<dyn CredentialStoreBuilder>, github_token: Option<String>) -> Self {
        Self {
            store,
            github_token: github_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Create a factory reading `$GITHUB_TOKEN` from the environment.
    pub fn from_env(store: Arc<dyn CredentialStoreBuilder>) -> Self {
        Self::new(store, std::env::var(GITHUB_TOKEN_ENV).ok())
    }

    /// Detect the hosting kind for `host`.
    fn detect_kind(
        &self,
        host: &str,
        server_url: &str,
        credentials: Result<&AuthConfig, &AuthError>,
    ) -> Result<IssueTrackerKind, IssueError> {
        if host.eq_ignore_ascii_case("github.com") {
            return Ok(IssueTrackerKind::GitHub);
        }
        let credentials = credentials.map_err(|e| IssueError::Credentials(e.clone()))?;
        if let Some(server) = credentials.find_server(server_url) {
            if let Ok(kind) = IssueTrackerKind::parse(&server.kind) {
                if kind.is_implemented() && kind != IssueTrackerKind::Jira {
                    return Ok(kind);
                }
                if !kind.is_implemented() {
                    return Err(kind.not_implemented());
                }
            }
        }
        if host.to_lowercase().starts_with("gitlab.") {
            return Err(IssueTrackerKind::GitLab.not_implemented());
        }
        Err(IssueError::NotFound(format!(
            "no git hosting service registered for host '{}'",
            host
        )))
    }

    /// The `$GITHUB_TOKEN` credential, when it applies to `server_url`.
    fn token_user(&self, server_url: &str) -> Option<UserAuth> {
        let token = self.github_token.as_deref().filter(|_| server_url == GITHUB_URL)?;
        debug!("using {} for github.com", GITHUB_TOKEN_ENV);
        Some(UserAuth::new(TOKEN_USERNAME, token.trim()))
    }

    /// Pick the git hosting credential: stored users, then the token, then a prompt.
    fn pick_user(
        &self,
        server_url: &str,
        credentials: Result<&AuthConfig, &AuthError>,
        message: &str,
        prompter: &dyn Prompter,
    ) -> Result<UserAuth, IssueError> {
        let credentials = match credentials {
            Ok(credentials) => credentials,
            Err(err) => {
                // Only the token can stand in for an unreadable file
                let user = self
                    .token_user(server_url)
                    .ok_or_else(|| IssueError::Credentials(err.clone()))?;
                warn!(error = %err, "ignoring unreadable credentials file for github.com");
                return Ok(user);
            }
        };

        let registered = credentials.find_server(server_url);
        if let Some(server) = registered.filter(|s| !s.users.is_empty()) {
            return credentials
                .pick_server_user_auth(server, message, prompter)
                .map_err(IssueError::Credentials);
        }
        if let Some(user) = self.token_user(server_url) {
            return Ok(user);
        }

        let fresh = AuthServer::new(server_url);
        credentials
            .pick_server_user_auth(registered.unwrap_or(&fresh), message, prompter)
            .map_err(IssueError::Credentials)
    }
}

impl IssueProviderFactory for DefaultIssueProviderFactory {
    fn resolve_git_hosting(
        &self,
        git_url: &str,
        message: &str,
        prompter: &dyn Prompter,
    ) -> Result<GitHostingClient, IssueError> {
        let info = parse_git_url(git_url)
            .map_err(|e| IssueError::NotFound(format!("cannot determine git host: {}", e)))?;
        let server_url = if info.host.eq_ignore_ascii_case("github.com") {
            GITHUB_URL.to_string()
        } else {
            format!("https://{}", info.host)
        };

        let credentials = self.store.build(None).map(AuthConfigService::into_config);
        let kind = self.detect_kind(&info.host, &server_url, credentials.as_ref())?;
        debug!(host = %info.host, kind = %kind, "resolved git hosting service");

        let user = self.pick_user(&server_url, credentials.as_ref(), message, prompter)?;

        Ok(GitHostingClient {
            kind,
            api_base: api_base_for(&server_url),
            server_url,
            user,
        })
    }

    fn create_issue_provider(
        &self,
        kind: &str,
        server: &AuthServer,
        user: &UserAuth,
        project: &str,
    ) -> Result<Box<dyn IssueProvider>, IssueError> {
        let kind = IssueTrackerKind::parse(kind)?;
        debug!(kind = %kind, server = %server.url, project = %project, "creating issue provider");
        match kind {
            IssueTrackerKind::Jira => Ok(Box::new(JiraIssueProvider::new(
                &server.url,
                &user.username,
                &user.api_token,
                project,
            )?)),
            IssueTrackerKind::GitHub => Ok(Box::new(GitHubIssueProvider::from_project(
                &server.url,
                &user.api_token,
                project,
            )?)),
            other => Err(other.not_implemented()),
        }
    }

    fn create_git_issue_provider(
        &self,
        client: GitHostingClient,
        organisation: &str,
        repo: &str,
    ) -> Result<Box<dyn IssueProvider>, IssueError> {
        match client.kind {
            IssueTrackerKind::GitHub => Ok(Box::new(GitHubIssueProvider::with_api_base(
                client.server_url,
                client.api_base,
                client.user.api_token,
                organisation,
                repo,
            ))),
            other => Err(other.not_implemented()),
        }
    }
}
