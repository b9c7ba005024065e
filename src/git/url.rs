//! git::url
//!
//! Remote URL parsing.
//!
//! Handles the URL shapes git accepts for remotes:
//! - `git@github.com:owner/repo.git` (scp-like)
//! - `ssh://git@host:2222/owner/repo.git`
//! - `https://host/owner/repo.git`, `http://…`, `git://…`
//!
//! The repository name is the last path segment; the organisation is
//! everything before it, so GitLab subgroups (`group/sub/project`) keep
//! `group/sub` as their organisation.

use thiserror::Error;

/// URL schemes accepted in front of `host/path`.
const SCHEMES: &[&str] = &["https://", "http://", "ssh://", "git+ssh://", "git://"];

/// Errors from remote URL parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitUrlError {
    /// The string is not a recognizable git remote URL.
    #[error("invalid git URL '{0}'")]
    Invalid(String),

    /// The URL has no organisation/repository path.
    #[error("git URL '{0}' does not name an organisation and repository")]
    MissingRepository(String),
}

/// Repository identity parsed from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepositoryInfo {
    /// Host name, lower-cased, without user or port
    pub host: String,
    /// Owning organisation or user (may contain `/` for nested groups)
    pub organisation: String,
    /// Repository name without `.git`
    pub name: String,
    /// The URL this was parsed from
    pub url: String,
}

impl GitRepositoryInfo {
    /// `organisation/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organisation, self.name)
    }

    /// Web URL of the repository.
    pub fn http_url(&self) -> String {
        format!("https://{}/{}", self.host, self.full_name())
    }
}

/// Parse a git remote URL into host, organisation and repository name.
///
/// # Example
///
/// ```
/// use tracklink::git::parse_git_url;
///
/// let info = parse_git_url("git@github.com:org/repo.git").unwrap();
/// assert_eq!(info.host, "github.com");
/// assert_eq!(info.organisation, "org");
/// assert_eq!(info.name, "repo");
/// ```
pub fn parse_git_url(url: &str) -> Result<GitRepositoryInfo, GitUrlError> {
    let trimmed = url.trim();
    let invalid = || GitUrlError::Invalid(url.to_string());

    let (authority, path) = if let Some(rest) = SCHEMES.iter().find_map(|s| trimmed.strip_prefix(s)) {
        match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        }
    } else if trimmed.contains("://") {
        return Err(invalid());
    } else {
        // scp-like: [user@]host:path
        let (authority, path) = trimmed.split_once(':').ok_or_else(invalid)?;
        if authority.contains('/') {
            return Err(invalid());
        }
        (authority, path)
    };

    let host = host_from_authority(authority).ok_or_else(invalid)?;

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let (name, org_segments) = match segments.split_last() {
        Some((name, org)) if !org.is_empty() => (*name, org),
        _ => return Err(GitUrlError::MissingRepository(url.to_string())),
    };

    Ok(GitRepositoryInfo {
        host,
        organisation: org_segments.join("/"),
        name: name.to_string(),
        url: url.to_string(),
    })
}

/// Strip user info and port from an authority component.
fn host_from_authority(authority: &str) -> Option<String> {
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port.split(':').next().unwrap_or(host_port);
    if host.is_empty() || host.contains(char::is_whitespace) {
        return None;
    }
    Some(host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(url: &str) -> (String, String, String) {
        let info = parse_git_url(url).unwrap();
        (info.host, info.organisation, info.name)
    }

    fn triple(host: &str, org: &str, name: &str) -> (String, String, String) {
        (host.to_string(), org.to_string(), name.to_string())
    }

    #[test]
    fn scp_like_with_suffix() {
        assert_eq!(
            parsed("git@github.com:org/repo.git"),
            triple("github.com", "org", "repo")
        );
    }

    #[test]
    fn scp_like_without_user() {
        assert_eq!(
            parsed("github.com:org/repo"),
            triple("github.com", "org", "repo")
        );
    }

    #[test]
    fn https_without_suffix() {
        assert_eq!(
            parsed("https://github.com/octocat/hello-world"),
            triple("github.com", "octocat", "hello-world")
        );
    }

    #[test]
    fn https_with_credentials_and_trailing_slash() {
        assert_eq!(
            parsed("https://user:pw@GitHub.example.com/org/repo.git/"),
            triple("github.example.com", "org", "repo")
        );
    }

    #[test]
    fn ssh_with_port() {
        assert_eq!(
            parsed("ssh://git@git.example.com:2222/team/service.git"),
            triple("git.example.com", "team", "service")
        );
    }

    #[test]
    fn nested_groups() {
        assert_eq!(
            parsed("git@gitlab.com:group/subgroup/project.git"),
            triple("gitlab.com", "group/subgroup", "project")
        );
    }

    #[test]
    fn helpers() {
        let info = parse_git_url("git@github.com:org/repo.git").unwrap();
        assert_eq!(info.full_name(), "org/repo");
        assert_eq!(info.http_url(), "https://github.com/org/repo");
        assert_eq!(info.url, "git@github.com:org/repo.git");
    }

    #[test]
    fn missing_repository() {
        assert_eq!(
            parse_git_url("https://github.com/org"),
            Err(GitUrlError::MissingRepository(
                "https://github.com/org".to_string()
            ))
        );
        assert!(matches!(
            parse_git_url("https://github.com"),
            Err(GitUrlError::MissingRepository(_))
        ));
    }

    #[test]
    fn invalid_urls() {
        for url in ["", "not-a-url", "/srv/git/repo.git", "ftp://host/org/repo", "a/b:org/repo"] {
            assert!(
                matches!(parse_git_url(url), Err(GitUrlError::Invalid(_))),
                "expected {:?} to be invalid",
                url
            );
        }
    }
}
