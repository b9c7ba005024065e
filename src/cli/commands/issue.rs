//! issue command - Work with issues of the resolved tracker
//!
//! # Example
//!
//! ```bash
//! tl issue get ABC-12
//! tl issue list --query "assignee = currentUser()"
//! tl issue create --title "Build is red" --label ci
//! tl issue comment ABC-12 "Fixed in main"
//! ```
//!
//! Each handler resolves a provider, then runs one of the async helpers
//! below on a fresh runtime. The helpers only see `&dyn IssueProvider`.

use anyhow::{Context as _, Result};

use super::tracker::resolve;
use crate::cli::Context;
use crate::issues::{CreateIssueRequest, Issue, IssueProvider};
use crate::ui::output::{self, format_issue, format_list};

/// Show one issue, or open it in the browser.
pub fn get(ctx: &Context, key: &str, web: bool) -> Result<()> {
    let provider = resolve(ctx)?;

    if web {
        let url = provider.issue_url(key);
        open::that(&url).with_context(|| format!("Failed to open {}", url))?;
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let text = rt.block_on(describe_issue(provider.as_ref(), key))?;
    output::print(text, ctx.verbosity);
    Ok(())
}

/// List issues, optionally filtered by a tracker-specific query.
pub fn list(ctx: &Context, query: Option<&str>) -> Result<()> {
    let provider = resolve(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    let text = rt.block_on(list_issues(provider.as_ref(), query))?;
    output::print(text, ctx.verbosity);
    Ok(())
}

/// Create an issue and print its key and URL.
pub fn create(ctx: &Context, title: String, body: Option<String>, labels: Vec<String>) -> Result<()> {
    let provider = resolve(ctx)?;
    let request = CreateIssueRequest {
        title,
        body,
        labels,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let issue = rt.block_on(create_issue(provider.as_ref(), request))?;

    // The key is printed even in quiet mode so scripts can capture it
    println!("{}", issue.key);
    output::print(&issue.url, ctx.verbosity);
    Ok(())
}

/// Add a comment to an issue.
pub fn comment(ctx: &Context, key: &str, body: &str) -> Result<()> {
    let provider = resolve(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    let text = rt.block_on(comment_on(provider.as_ref(), key, body))?;
    output::print(text, ctx.verbosity);
    Ok(())
}

/// Summary line, URL and body of one issue.
async fn describe_issue(provider: &dyn IssueProvider, key: &str) -> Result<String> {
    let issue = provider
        .get_issue(key)
        .await
        .with_context(|| format!("Failed to get issue {}", key))?;

    let mut text = format!("{}\n{}", format_issue(&issue), issue.url);
    if let Some(body) = issue.body.as_deref().filter(|b| !b.trim().is_empty()) {
        text.push_str(&format!("\n\n{}", body.trim_end()));
    }
    Ok(text)
}

/// One summary line per matching issue.
async fn list_issues(provider: &dyn IssueProvider, query: Option<&str>) -> Result<String> {
    let issues = provider
        .search_issues(query.unwrap_or(""))
        .await
        .context("Failed to search issues")?;

    if issues.is_empty() {
        return Ok("No issues found".to_string());
    }
    let lines: Vec<String> = issues.iter().map(format_issue).collect();
    Ok(format_list(&lines, ""))
}

async fn create_issue(provider: &dyn IssueProvider, request: CreateIssueRequest) -> Result<Issue> {
    if request.title.trim().is_empty() {
        anyhow::bail!("Issue title cannot be empty");
    }
    provider
        .create_issue(request)
        .await
        .context("Failed to create issue")
}

async fn comment_on(provider: &dyn IssueProvider, key: &str, body: &str) -> Result<String> {
    provider
        .create_issue_comment(key, body)
        .await
        .with_context(|| format!("Failed to comment on issue {}", key))?;
    Ok(format!("Commented on {}", provider.issue_url(key)))
}
