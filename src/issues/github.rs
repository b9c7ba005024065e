//! issues::github
//!
//! GitHub issue provider using the REST v3 issues API.
//!
//! # Design
//!
//! Serves both a named tracker of kind `github` (project `owner/repo`) and
//! the git hosting fallback. GitHub reports pull requests through the issues
//! endpoints; they are filtered out of every list result.
//!
//! # Endpoints
//!
//! - github.com: API base `https://api.github.com`
//! - GitHub Enterprise: API base `https://<host>/api/v3`
//!
//! # Example
//!
//! ```ignore
//! use tracklink::issues::github::GitHubIssueProvider;
//!
//! let provider = GitHubIssueProvider::new("https://github.com", "ghp_xxx", "octocat", "hello-world");
//! let issue = provider.get_issue("42").await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{CreateIssueRequest, Issue, IssueError, IssueProvider, IssueState};

/// API base URL for github.com.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Web URL for github.com.
pub const GITHUB_URL: &str = "https://github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "tracklink-cli";

/// Page size for list requests.
const PER_PAGE: &str = "100";

/// API base URL for a GitHub server.
///
/// # Example
///
/// ```
/// use tracklink::issues::github::api_base_for;
///
/// assert_eq!(api_base_for("https://github.com"), "https://api.github.com");
/// assert_eq!(api_base_for("https://ghe.corp.io/"), "https://ghe.corp.io/api/v3");
/// ```
pub fn api_base_for(server_url: &str) -> String {
    let server = server_url.trim_end_matches('/');
    let host = server
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(server);
    if host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("www.github.com") {
        GITHUB_API_BASE.to_string()
    } else {
        format!("{}/api/v3", server)
    }
}

/// GitHub issue provider for one repository.
pub struct GitHubIssueProvider {
    client: Client,
    token: String,
    owner: String,
    repo: String,
    /// Web URL of the server (e.g., `https://github.com`)
    server_url: String,
    /// REST API base (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubIssueProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubIssueProvider")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("server_url", &self.server_url)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHubIssueProvider {
    /// Create a provider for `owner/repo` on `server_url`.
    ///
    /// The API base is derived with [`api_base_for`].
    pub fn new(
        server_url: impl Into<String>,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        let api_base = api_base_for(&server_url);
        Self::with_api_base(server_url, api_base, token, owner, repo)
    }

    /// Create a provider with an explicit API base URL.
    pub fn with_api_base(
        server_url: impl Into<String>,
        api_base: impl Into<String>,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a provider from a `owner/repo` project string.
    pub fn from_project(
        server_url: impl Into<String>,
        token: impl Into<String>,
        project: &str,
    ) -> Result<Self, IssueError> {
        let (owner, repo) = split_project(project)?;
        Ok(Self::new(server_url, token, owner, repo))
    }

    /// Repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// REST API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn headers(&self) -> Result<HeaderMap, IssueError> {
        if self.token.is_empty() {
            return Err(IssueError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| IssueError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    async fn list_issues(&self, params: &[(&str, String)]) -> Result<Vec<Issue>, IssueError> {
        let response = self
            .client
            .get(self.repo_url("issues"))
            .headers(self.headers()?)
            .query(params)
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let items: Vec<GitHubIssue> = handle_response(response).await?;
        Ok(items
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect())
    }
}

#[async_trait]
impl IssueProvider for GitHubIssueProvider {
    fn kind(&self) -> &'static str {
        "github"
    }

    async fn get_issue(&self, key: &str) -> Result<Issue, IssueError> {
        let number = parse_issue_number(key)?;
        let response = self
            .client
            .get(self.repo_url(&format!("issues/{}", number)))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let issue: GitHubIssue = handle_response(response).await?;
        if issue.pull_request.is_some() {
            return Err(IssueError::NotFound(format!(
                "#{} is a pull request, not an issue",
                number
            )));
        }
        Ok(issue.into())
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>, IssueError> {
        let query = query.trim();
        if query.is_empty() {
            return self
                .list_issues(&[("state", "open".to_string()), ("per_page", PER_PAGE.to_string())])
                .await;
        }

        let q = format!("repo:{}/{} is:issue {}", self.owner, self.repo, query);
        debug!(query = %q, "searching GitHub issues");
        let response = self
            .client
            .get(format!("{}/search/issues", self.api_base))
            .headers(self.headers()?)
            .query(&[("q", q.as_str()), ("per_page", PER_PAGE)])
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let result: GitHubSearchResult = handle_response(response).await?;
        Ok(result
            .items
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect())
    }

    async fn search_issues_closed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>, IssueError> {
        // `since` filters on update time; closed_at is checked locally
        let issues = self
            .list_issues(&[
                ("state", "closed".to_string()),
                ("since", since.to_rfc3339()),
                ("per_page", PER_PAGE.to_string()),
            ])
            .await?;
        Ok(issues
            .into_iter()
            .filter(|i| i.closed_at.map(|t| t >= since).unwrap_or(false))
            .collect())
    }

    async fn create_issue(&self, request: CreateIssueRequest) -> Result<Issue, IssueError> {
        let body = CreateIssueBody {
            title: &request.title,
            body: request.body.as_deref(),
            labels: &request.labels,
        };

        let response = self
            .client
            .post(self.repo_url("issues"))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let issue: GitHubIssue = handle_response(response).await?;
        Ok(issue.into())
    }

    async fn create_issue_comment(&self, key: &str, body: &str) -> Result<(), IssueError> {
        let number = parse_issue_number(key)?;
        let response = self
            .client
            .post(self.repo_url(&format!("issues/{}/comments", number)))
            .headers(self.headers()?)
            .json(&CommentBody { body })
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let _: serde_json::Value = handle_response(response).await?;
        Ok(())
    }

    fn issue_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}/issues/{}",
            self.server_url,
            self.owner,
            self.repo,
            key.trim_start_matches('#')
        )
    }

    fn home_url(&self) -> String {
        format!("{}/{}/{}/issues", self.server_url, self.owner, self.repo)
    }
}

/// Split an `owner/repo` project string.
fn split_project(project: &str) -> Result<(String, String), IssueError> {
    let invalid = |message: &str| IssueError::InvalidProject {
        project: project.to_string(),
        message: message.to_string(),
    };
    let (owner, repo) = project
        .trim()
        .trim_matches('/')
        .rsplit_once('/')
        .ok_or_else(|| invalid("expected 'owner/repo'"))?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid("expected 'owner/repo'"));
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Parse an issue key such as `42` or `#42`.
fn parse_issue_number(key: &str) -> Result<u64, IssueError> {
    key.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| IssueError::NotFound(format!("'{}' is not a GitHub issue number", key)))
}

/// Handle API response, mapping errors appropriately.
async fn handle_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IssueError> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| IssueError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })
    } else {
        Err(error_from_response(response, status).await)
    }
}

/// Map an error response to an [`IssueError`].
async fn error_from_response(response: Response, status: StatusCode) -> IssueError {
    let rate_limited = response
        .headers()
        .get("X-RateLimit-Remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "0")
        .unwrap_or(false);

    let message = match response.json::<GitHubErrorResponse>().await {
        Ok(err) => err.message,
        Err(_) => "Unknown error".to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => IssueError::AuthFailed("Invalid or expired token".into()),
        StatusCode::FORBIDDEN if rate_limited => IssueError::RateLimited,
        StatusCode::FORBIDDEN => IssueError::AuthFailed(format!("Permission denied: {}", message)),
        StatusCode::NOT_FOUND => IssueError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => IssueError::RateLimited,
        _ if status.is_server_error() => IssueError::ApiError {
            status: status.as_u16(),
            message: format!("GitHub server error: {}", message),
        },
        _ => IssueError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a [String],
}

fn no_labels(labels: &&[String]) -> bool {
    labels.is_empty()
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    state: String,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    created_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    /// Present only when the item is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Deserialize)]
struct GitHubSearchResult {
    items: Vec<GitHubIssue>,
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl From<GitHubIssue> for Issue {
    fn from(gh: GitHubIssue) -> Self {
        let state = if gh.state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        };
        Issue {
            key: gh.number.to_string(),
            title: gh.title,
            body: gh.body,
            url: gh.html_url,
            state,
            labels: gh.labels.into_iter().map(|l| l.name).collect(),
            created_at: gh.created_at,
            closed_at: gh.closed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GitHubIssueProvider {
        GitHubIssueProvider::with_api_base("https://github.com", server.uri(), "ghp_test", "acme", "widgets")
    }

    fn issue_json(number: u64, state: &str) -> serde_json::Value {
        json!({
            "number": number,
            "title": format!("Issue {}", number),
            "body": "details",
            "html_url": format!("https://github.com/acme/widgets/issues/{}", number),
            "state": state,
            "labels": [{"name": "bug"}],
            "created_at": "2024-01-02T03:04:05Z",
            "closed_at": null
        })
    }

    mod api_base {
        use super::*;

        #[test]
        fn github_com() {
            assert_eq!(api_base_for("https://github.com"), GITHUB_API_BASE);
            assert_eq!(api_base_for("https://github.com/"), GITHUB_API_BASE);
        }

        #[test]
        fn enterprise() {
            assert_eq!(
                api_base_for("https://github.example.com"),
                "https://github.example.com/api/v3"
            );
        }
    }

    mod project {
        use super::*;

        #[test]
        fn splits_owner_and_repo() {
            let p = GitHubIssueProvider::from_project("https://github.com", "t", "acme/widgets")
                .unwrap();
            assert_eq!(p.owner(), "acme");
            assert_eq!(p.repo(), "widgets");
            assert_eq!(p.api_base(), GITHUB_API_BASE);
        }

        #[test]
        fn rejects_bare_name() {
            let err = GitHubIssueProvider::from_project("https://github.com", "t", "widgets")
                .unwrap_err();
            assert!(matches!(err, IssueError::InvalidProject { .. }));
        }
    }

    mod urls {
        use super::*;

        #[test]
        fn issue_and_home_urls() {
            let p = GitHubIssueProvider::new("https://github.com/", "t", "acme", "widgets");
            assert_eq!(p.issue_url("#7"), "https://github.com/acme/widgets/issues/7");
            assert_eq!(p.home_url(), "https://github.com/acme/widgets/issues");
        }

        #[test]
        fn debug_redacts_token() {
            let p = GitHubIssueProvider::new("https://github.com", "ghp_secret", "acme", "widgets");
            let debug = format!("{:?}", p);
            assert!(!debug.contains("ghp_secret"));
            assert!(debug.contains("acme"));
        }
    }

    mod api {
        use super::*;

        #[tokio::test]
        async fn get_issue() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/42"))
                .and(header("authorization", "Bearer ghp_test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(42, "open")))
                .mount(&server)
                .await;

            let issue = provider(&server).get_issue("#42").await.unwrap();
            assert_eq!(issue.key, "42");
            assert_eq!(issue.state, IssueState::Open);
            assert_eq!(issue.labels, vec!["bug".to_string()]);
            assert!(issue.created_at.is_some());
        }

        #[tokio::test]
        async fn get_pull_request_is_not_found() {
            let server = MockServer::start().await;
            let mut pr = issue_json(5, "open");
            pr["pull_request"] = json!({"url": "x"});
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/5"))
                .respond_with(ResponseTemplate::new(200).set_body_json(pr))
                .mount(&server)
                .await;

            let err = provider(&server).get_issue("5").await.unwrap_err();
            assert!(matches!(err, IssueError::NotFound(_)));
        }

        #[tokio::test]
        async fn list_filters_pull_requests() {
            let server = MockServer::start().await;
            let mut pr = issue_json(2, "open");
            pr["pull_request"] = json!({"url": "x"});
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues"))
                .and(query_param("state", "open"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!([issue_json(1, "open"), pr])),
                )
                .mount(&server)
                .await;

            let issues = provider(&server).search_issues("").await.unwrap();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].key, "1");
        }

        #[tokio::test]
        async fn search_scopes_to_repo() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/search/issues"))
                .and(query_param("q", "repo:acme/widgets is:issue label:bug"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"total_count": 1, "items": [issue_json(3, "open")]})),
                )
                .mount(&server)
                .await;

            let issues = provider(&server).search_issues("label:bug").await.unwrap();
            assert_eq!(issues.len(), 1);
        }

        #[tokio::test]
        async fn closed_since_checks_close_time() {
            let server = MockServer::start().await;
            let mut recent = issue_json(8, "closed");
            recent["closed_at"] = json!("2024-03-01T00:00:00Z");
            let mut old = issue_json(9, "closed");
            old["closed_at"] = json!("2023-12-01T00:00:00Z");
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues"))
                .and(query_param("state", "closed"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([recent, old])))
                .mount(&server)
                .await;

            let since = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
            let issues = provider(&server)
                .search_issues_closed_since(since)
                .await
                .unwrap();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].key, "8");
            assert_eq!(issues[0].state, IssueState::Closed);
        }

        #[tokio::test]
        async fn create_issue_posts_body() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/acme/widgets/issues"))
                .and(body_json(json!({"title": "Issue 10", "labels": ["bug"]})))
                .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(10, "open")))
                .mount(&server)
                .await;

            let request = CreateIssueRequest {
                title: "Issue 10".into(),
                body: None,
                labels: vec!["bug".into()],
            };
            let issue = provider(&server).create_issue(request).await.unwrap();
            assert_eq!(issue.key, "10");
        }

        #[tokio::test]
        async fn comment() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/acme/widgets/issues/4/comments"))
                .and(body_json(json!({"body": "thanks"})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
                .expect(1)
                .mount(&server)
                .await;

            provider(&server)
                .create_issue_comment("4", "thanks")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn error_mapping() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/1"))
                .respond_with(
                    ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/2"))
                .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/3"))
                .respond_with(
                    ResponseTemplate::new(403)
                        .insert_header("X-RateLimit-Remaining", "0")
                        .set_body_json(json!({"message": "API rate limit exceeded"})),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/repos/acme/widgets/issues/4"))
                .respond_with(ResponseTemplate::new(502))
                .mount(&server)
                .await;

            let p = provider(&server);
            assert!(matches!(p.get_issue("1").await, Err(IssueError::AuthFailed(_))));
            assert!(matches!(p.get_issue("2").await, Err(IssueError::NotFound(_))));
            assert!(matches!(p.get_issue("3").await, Err(IssueError::RateLimited)));
            assert!(matches!(
                p.get_issue("4").await,
                Err(IssueError::ApiError { status: 502, .. })
            ));
        }

        #[tokio::test]
        async fn empty_token_requires_auth() {
            let p = GitHubIssueProvider::with_api_base("https://github.com", "http://127.0.0.1:1", "", "a", "b");
            assert!(matches!(p.get_issue("1").await, Err(IssueError::AuthRequired)));
        }

        #[tokio::test]
        async fn invalid_key_is_not_found() {
            let p = GitHubIssueProvider::with_api_base("https://github.com", "http://127.0.0.1:1", "t", "a", "b");
            assert!(matches!(p.get_issue("ABC-1").await, Err(IssueError::NotFound(_))));
        }
    }
}
