//! issues::jira
//!
//! Jira issue provider using the REST v2 API with basic authentication
//! (username plus API token).
//!
//! Every search is scoped with JQL `project = <key>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{CreateIssueRequest, Issue, IssueError, IssueProvider, IssueState};

const USER_AGENT_VALUE: &str = "tracklink-cli";

/// Fields requested for issue reads.
const ISSUE_FIELDS: &str = "summary,description,status,labels,created,resolutiondate";

/// Results requested per search page.
const PAGE_SIZE: usize = 100;

/// Issue type used for new issues.
const DEFAULT_ISSUE_TYPE: &str = "Bug";

/// Jira issue provider for one project.
pub struct JiraIssueProvider {
    client: Client,
    base_url: String,
    username: String,
    api_token: String,
    project: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for JiraIssueProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraIssueProvider")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl JiraIssueProvider {
    /// Create a provider for `project` on the Jira server at `base_url`.
    ///
    /// # Errors
    ///
    /// `IssueError::InvalidProject` when the project key is empty or
    /// contains whitespace.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        project: impl Into<String>,
    ) -> Result<Self, IssueError> {
        let project = project.into().trim().to_string();
        if project.is_empty() || project.contains(char::is_whitespace) {
            return Err(IssueError::InvalidProject {
                project,
                message: "a Jira project key is required (e.g., 'ABC')".into(),
            });
        }
        Ok(Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            api_token: api_token.into(),
            project,
        })
    }

    /// The Jira project key.
    pub fn project(&self) -> &str {
        &self.project
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    /// Attach authentication and common headers.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, IssueError> {
        if self.username.is_empty() || self.api_token.is_empty() {
            return Err(IssueError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(request
            .headers(headers)
            .basic_auth(&self.username, Some(&self.api_token)))
    }

    /// Run a JQL search, following `startAt` until every page is read.
    async fn search(&self, jql: &str) -> Result<Vec<Issue>, IssueError> {
        debug!(jql = %jql, "searching Jira issues");
        let mut issues = Vec::new();
        let mut start_at: usize = 0;

        loop {
            let request = self.client.get(self.api_url("search")).query(&[
                ("jql", jql.to_string()),
                ("fields", ISSUE_FIELDS.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ]);
            let response = self
                .authorize(request)?
                .send()
                .await
                .map_err(|e| IssueError::NetworkError(e.to_string()))?;

            let page: JiraSearchResult = handle_response(response).await?;
            let page_count = page.issues.len();
            issues.extend(page.issues.into_iter().map(|i| self.to_issue(i)));

            // Servers may cap maxResults below PAGE_SIZE, so a short page is not the last
            start_at += page_count;
            if page_count == 0 || start_at >= page.total {
                break;
            }
            debug!(start_at, total = page.total, "fetching next Jira search page");
        }

        Ok(issues)
    }

    fn project_clause(&self) -> String {
        format!("project = \"{}\"", jql_escape(&self.project))
    }

    fn to_issue(&self, jira: JiraIssue) -> Issue {
        let fields = jira.fields;
        let closed = fields
            .status
            .as_ref()
            .and_then(|s| s.status_category.as_ref())
            .map(|c| c.key == "done")
            .unwrap_or(false);
        Issue {
            url: self.issue_url(&jira.key),
            key: jira.key,
            title: fields.summary.unwrap_or_default(),
            body: fields.description.filter(|d| !d.is_empty()),
            state: if closed {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            labels: fields.labels,
            created_at: fields.created.as_deref().and_then(parse_jira_time),
            closed_at: fields.resolutiondate.as_deref().and_then(parse_jira_time),
        }
    }
}

#[async_trait]
impl IssueProvider for JiraIssueProvider {
    fn kind(&self) -> &'static str {
        "jira"
    }

    async fn get_issue(&self, key: &str) -> Result<Issue, IssueError> {
        let request = self
            .client
            .get(self.api_url(&format!("issue/{}", key.trim())))
            .query(&[("fields", ISSUE_FIELDS)]);
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let issue: JiraIssue = handle_response(response).await?;
        Ok(self.to_issue(issue))
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>, IssueError> {
        let query = query.trim();
        let jql = if query.is_empty() {
            format!(
                "{} AND statusCategory != Done ORDER BY created DESC",
                self.project_clause()
            )
        } else {
            format!("{} AND ({})", self.project_clause(), query)
        };
        self.search(&jql).await
    }

    async fn search_issues_closed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>, IssueError> {
        let jql = format!(
            "{} AND statusCategory = Done AND resolutiondate >= \"{}\"",
            self.project_clause(),
            since.format("%Y/%m/%d %H:%M")
        );
        self.search(&jql).await
    }

    async fn create_issue(&self, request: CreateIssueRequest) -> Result<Issue, IssueError> {
        let body = CreateIssueBody {
            fields: CreateIssueFields {
                project: ProjectRef { key: &self.project },
                summary: &request.title,
                description: request.body.as_deref(),
                issuetype: IssueTypeRef {
                    name: DEFAULT_ISSUE_TYPE,
                },
                labels: &request.labels,
            },
        };

        let http = self.client.post(self.api_url("issue")).json(&body);
        let response = self
            .authorize(http)?
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let created: CreatedIssue = handle_response(response).await?;
        Ok(Issue {
            url: self.issue_url(&created.key),
            key: created.key,
            title: request.title,
            body: request.body,
            state: IssueState::Open,
            labels: request.labels,
            created_at: None,
            closed_at: None,
        })
    }

    async fn create_issue_comment(&self, key: &str, body: &str) -> Result<(), IssueError> {
        let http = self
            .client
            .post(self.api_url(&format!("issue/{}/comment", key.trim())))
            .json(&CommentBody { body });
        let response = self
            .authorize(http)?
            .send()
            .await
            .map_err(|e| IssueError::NetworkError(e.to_string()))?;

        let _: serde_json::Value = handle_response(response).await?;
        Ok(())
    }

    fn issue_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    fn home_url(&self) -> String {
        format!("{}/browse/{}", self.base_url, self.project)
    }
}

/// Parse a Jira timestamp such as `2024-01-02T03:04:05.000+0000`.
fn parse_jira_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

async fn handle_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IssueError> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| IssueError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })
    } else {
        let message = match response.json::<JiraErrorResponse>().await {
            Ok(err) => err.summary(),
            Err(_) => "Unknown error".to_string(),
        };
        Err(match status {
            StatusCode::UNAUTHORIZED => IssueError::AuthFailed("Invalid username or API token".into()),
            StatusCode::FORBIDDEN => IssueError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => IssueError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => IssueError::RateLimited,
            _ => IssueError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateIssueBody<'a> {
    fields: CreateIssueFields<'a>,
}

#[derive(Serialize)]
struct CreateIssueFields<'a> {
    project: ProjectRef<'a>,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    issuetype: IssueTypeRef<'a>,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a [String],
}

fn no_labels(labels: &&[String]) -> bool {
    labels.is_empty()
}

#[derive(Serialize)]
struct ProjectRef<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct IssueTypeRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Deserialize)]
struct JiraSearchResult {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

/// Escape a value for use inside a double-quoted JQL string.
fn jql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraFields,
}

#[derive(Deserialize)]
struct JiraFields {
    summary: Option<String>,
    description: Option<String>,
    status: Option<JiraStatus>,
    #[serde(default)]
    labels: Vec<String>,
    created: Option<String>,
    resolutiondate: Option<String>,
}

#[derive(Deserialize)]
struct JiraStatus {
    #[serde(rename = "statusCategory")]
    status_category: Option<JiraStatusCategory>,
}

#[derive(Deserialize)]
struct JiraStatusCategory {
    key: String,
}

#[derive(Deserialize)]
struct JiraErrorResponse {
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: std::collections::BTreeMap<String, String>,
}

impl JiraErrorResponse {
    fn summary(self) -> String {
        let mut parts = self.error_messages;
        parts.extend(self.errors.into_iter().map(|(k, v)| format!("{}: {}", k, v)));
        if parts.is_empty() {
            "Unknown error".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> JiraIssueProvider {
        JiraIssueProvider::new(server.uri(), "alice", "secret", "ABC").expect("valid project")
    }

    fn issue_json(key: &str, category: &str) -> serde_json::Value {
        json!({
            "key": key,
            "fields": {
                "summary": "Flaky test",
                "description": "It fails sometimes",
                "status": {"name": "In Progress", "statusCategory": {"key": category}},
                "labels": ["ci"],
                "created": "2024-01-02T03:04:05.000+0000",
                "resolutiondate": null
            }
        })
    }

    mod construction {
        use super::*;

        #[test]
        fn rejects_empty_project() {
            let err = JiraIssueProvider::new("https://jira.example.com", "a", "t", " ").unwrap_err();
            assert!(matches!(err, IssueError::InvalidProject { .. }));
        }

        #[test]
        fn urls() {
            let p = JiraIssueProvider::new("https://jira.example.com/", "a", "t", "ABC").unwrap();
            assert_eq!(p.issue_url("ABC-1"), "https://jira.example.com/browse/ABC-1");
            assert_eq!(p.home_url(), "https://jira.example.com/browse/ABC");
            assert_eq!(p.kind(), "jira");
        }

        #[test]
        fn debug_redacts_token() {
            let p = JiraIssueProvider::new("https://jira.example.com", "a", "s3cret", "ABC").unwrap();
            assert!(!format!("{:?}", p).contains("s3cret"));
        }

        #[test]
        fn project_key_is_escaped_in_jql() {
            let p = JiraIssueProvider::new("https://jira.example.com", "a", "t", "A\"B\\C").unwrap();
            assert_eq!(p.project_clause(), r#"project = "A\"B\\C""#);
            assert_eq!(jql_escape("ABC"), "ABC");
        }

        #[test]
        fn parses_jira_timestamps() {
            let t = parse_jira_time("2024-01-02T03:04:05.000+0000").unwrap();
            assert_eq!(t.to_rfc3339(), "2024-01-02T03:04:05+00:00");
            assert!(parse_jira_time("yesterday").is_none());
        }
    }

    mod api {
        use super::*;

        #[tokio::test]
        async fn get_issue_uses_basic_auth() {
            let server = MockServer::start().await;
            // base64("alice:secret")
            Mock::given(method("GET"))
                .and(path("/rest/api/2/issue/ABC-1"))
                .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
                .respond_with(ResponseTemplate::new(200).set_body_json(issue_json("ABC-1", "indeterminate")))
                .mount(&server)
                .await;

            let issue = provider(&server).get_issue("ABC-1").await.unwrap();
            assert_eq!(issue.key, "ABC-1");
            assert_eq!(issue.title, "Flaky test");
            assert_eq!(issue.state, IssueState::Open);
            assert_eq!(issue.labels, vec!["ci".to_string()]);
            assert!(issue.created_at.is_some());
            assert!(issue.url.ends_with("/browse/ABC-1"));
        }

        #[tokio::test]
        async fn done_category_is_closed() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/issue/ABC-2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(issue_json("ABC-2", "done")))
                .mount(&server)
                .await;

            let issue = provider(&server).get_issue("ABC-2").await.unwrap();
            assert_eq!(issue.state, IssueState::Closed);
        }

        #[tokio::test]
        async fn search_is_scoped_to_project() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param("jql", "project = \"ABC\" AND (labels = ci)"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "total": 1,
                    "issues": [issue_json("ABC-3", "new")]
                })))
                .mount(&server)
                .await;

            let issues = provider(&server).search_issues("labels = ci").await.unwrap();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].key, "ABC-3");
        }

        #[tokio::test]
        async fn search_follows_pages() {
            let server = MockServer::start().await;
            let first: Vec<_> = (1..=100).map(|n| issue_json(&format!("ABC-{}", n), "new")).collect();
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param("startAt", "0"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "startAt": 0,
                    "total": 101,
                    "issues": first
                })))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param("startAt", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "startAt": 100,
                    "total": 101,
                    "issues": [issue_json("ABC-101", "new")]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let issues = provider(&server).search_issues("").await.unwrap();
            assert_eq!(issues.len(), 101);
            assert_eq!(issues[100].key, "ABC-101");
        }

        #[tokio::test]
        async fn search_stops_on_empty_page() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "total": 50,
                    "issues": []
                })))
                .expect(1)
                .mount(&server)
                .await;

            let issues = provider(&server).search_issues("").await.unwrap();
            assert!(issues.is_empty());
        }

        #[tokio::test]
        async fn closed_since_query() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param(
                    "jql",
                    "project = \"ABC\" AND statusCategory = Done AND resolutiondate >= \"2024/01/01 00:00\"",
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"issues": []})))
                .expect(1)
                .mount(&server)
                .await;

            let since = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
            let issues = provider(&server)
                .search_issues_closed_since(since)
                .await
                .unwrap();
            assert!(issues.is_empty());
        }

        #[tokio::test]
        async fn create_issue() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/rest/api/2/issue"))
                .and(body_json(json!({
                    "fields": {
                        "project": {"key": "ABC"},
                        "summary": "Crash on start",
                        "description": "stack trace",
                        "issuetype": {"name": "Bug"}
                    }
                })))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "id": "10001", "key": "ABC-9", "self": "x"
                })))
                .mount(&server)
                .await;

            let request = CreateIssueRequest {
                title: "Crash on start".into(),
                body: Some("stack trace".into()),
                labels: vec![],
            };
            let issue = provider(&server).create_issue(request).await.unwrap();
            assert_eq!(issue.key, "ABC-9");
            assert_eq!(issue.state, IssueState::Open);
        }

        #[tokio::test]
        async fn comment() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/rest/api/2/issue/ABC-1/comment"))
                .and(body_json(json!({"body": "fixed in main"})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "1"})))
                .expect(1)
                .mount(&server)
                .await;

            provider(&server)
                .create_issue_comment("ABC-1", "fixed in main")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn error_messages_are_collected() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/issue/ABC-404"))
                .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                    "errorMessages": ["Issue does not exist or you do not have permission to see it."],
                    "errors": {}
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/rest/api/2/issue/ABC-401"))
                .respond_with(ResponseTemplate::new(401))
                .mount(&server)
                .await;

            let p = provider(&server);
            match p.get_issue("ABC-404").await {
                Err(IssueError::NotFound(msg)) => assert!(msg.contains("does not exist")),
                other => panic!("unexpected: {:?}", other),
            }
            assert!(matches!(p.get_issue("ABC-401").await, Err(IssueError::AuthFailed(_))));
        }

        #[tokio::test]
        async fn missing_credentials() {
            let p = JiraIssueProvider::new("http://127.0.0.1:1", "", "", "ABC").unwrap();
            assert!(matches!(p.get_issue("ABC-1").await, Err(IssueError::AuthRequired)));
        }
    }
}
