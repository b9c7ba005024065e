//! issues::mock
//!
//! Mock issue provider for deterministic testing.
//!
//! Issues live in memory, keys are assigned as `<prefix>-<n>`, and a single
//! operation can be configured to fail.
//!
//! # Example
//!
//! ```
//! use tracklink::issues::mock::MockIssueProvider;
//! use tracklink::issues::{CreateIssueRequest, IssueProvider, IssueState};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockIssueProvider::new("MOCK");
//! let issue = provider.create_issue(CreateIssueRequest::new("Broken")).await.unwrap();
//! assert_eq!(issue.key, "MOCK-1");
//! assert_eq!(issue.state, IssueState::Open);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::traits::{CreateIssueRequest, Issue, IssueError, IssueProvider, IssueState};

/// Mock issue provider.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockIssueProvider {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug)]
struct MockInner {
    prefix: String,
    issues: BTreeMap<String, Issue>,
    comments: Vec<(String, String)>,
    next_number: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetIssue(IssueError),
    SearchIssues(IssueError),
    CreateIssue(IssueError),
    CreateComment(IssueError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    GetIssue { key: String },
    SearchIssues { query: String },
    SearchClosedSince { since: DateTime<Utc> },
    CreateIssue { title: String },
    CreateComment { key: String, body: String },
}

impl MockIssueProvider {
    /// Create an empty mock whose keys start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                prefix: prefix.into(),
                issues: BTreeMap::new(),
                comments: Vec::new(),
                next_number: 1,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Add an existing issue.
    pub fn with_issue(self, issue: Issue) -> Self {
        self.lock().issues.insert(issue.key.clone(), issue);
        self
    }

    /// Fail the given operation from now on.
    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on = Some(fail);
    }

    /// Operations recorded so far.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Comments added so far, as `(key, body)`.
    pub fn comments(&self) -> Vec<(String, String)> {
        self.lock().comments.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        // A poisoned mock only happens after a panicking test; keep going
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn mock_url(key: &str) -> String {
    format!("https://issues.invalid/browse/{}", key)
}

#[async_trait]
impl IssueProvider for MockIssueProvider {
    fn kind(&self) -> &'static str {
        "mock"
    }

    async fn get_issue(&self, key: &str) -> Result<Issue, IssueError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::GetIssue { key: key.into() });
        if let Some(FailOn::GetIssue(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        inner
            .issues
            .get(key)
            .cloned()
            .ok_or_else(|| IssueError::NotFound(format!("issue {}", key)))
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>, IssueError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::SearchIssues {
            query: query.into(),
        });
        if let Some(FailOn::SearchIssues(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let query = query.trim().to_lowercase();
        Ok(inner
            .issues
            .values()
            .filter(|i| {
                if query.is_empty() {
                    i.state == IssueState::Open
                } else {
                    i.title.to_lowercase().contains(&query)
                }
            })
            .cloned()
            .collect())
    }

    async fn search_issues_closed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>, IssueError> {
        let mut inner = self.lock();
        inner
            .operations
            .push(MockOperation::SearchClosedSince { since });
        if let Some(FailOn::SearchIssues(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner
            .issues
            .values()
            .filter(|i| i.closed_at.map(|t| t >= since).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn create_issue(&self, request: CreateIssueRequest) -> Result<Issue, IssueError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::CreateIssue {
            title: request.title.clone(),
        });
        if let Some(FailOn::CreateIssue(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        let key = format!("{}-{}", inner.prefix, inner.next_number);
        inner.next_number += 1;
        let issue = Issue {
            url: mock_url(&key),
            key: key.clone(),
            title: request.title,
            body: request.body,
            state: IssueState::Open,
            labels: request.labels,
            created_at: Some(Utc::now()),
            closed_at: None,
        };
        inner.issues.insert(key, issue.clone());
        Ok(issue)
    }

    async fn create_issue_comment(&self, key: &str, body: &str) -> Result<(), IssueError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::CreateComment {
            key: key.into(),
            body: body.into(),
        });
        if let Some(FailOn::CreateComment(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        if !inner.issues.contains_key(key) {
            return Err(IssueError::NotFound(format!("issue {}", key)));
        }
        inner.comments.push((key.into(), body.into()));
        Ok(())
    }

    fn issue_url(&self, key: &str) -> String {
        mock_url(key)
    }

    fn home_url(&self) -> String {
        format!("https://issues.invalid/browse/{}", self.lock().prefix)
    }
}
