//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Project Config
//!
//! Located at `<dir>/.tracklink/config.toml`.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$TRACKLINK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tracklink/config.toml`
//! 3. `~/.tracklink/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., a tracker URL must be http or https).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Project configuration.
///
/// # Example
///
/// ```toml
/// [issue_tracker]
/// kind = "jira"
/// url = "https://jira.example.com"
/// project = "ABC"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Explicit issue tracker for this project
    pub issue_tracker: Option<IssueTrackerConfig>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(it) = &self.issue_tracker {
            it.validate()?;
        }
        Ok(())
    }

    /// The issue tracker, if it is usable.
    ///
    /// A tracker section missing its kind or URL counts as absent.
    pub fn configured_tracker(&self) -> Option<&IssueTrackerConfig> {
        self.issue_tracker.as_ref().filter(|it| it.is_configured())
    }
}

/// Issue tracker section of the project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IssueTrackerConfig {
    /// Tracker type (e.g., "jira", "github")
    pub kind: String,

    /// Tracker server URL
    pub url: String,

    /// Tracker-side project key
    pub project: String,
}

impl IssueTrackerConfig {
    /// Create a tracker section.
    pub fn new(
        kind: impl Into<String>,
        url: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
            project: project.into(),
        }
    }

    /// Whether both kind and URL are set.
    pub fn is_configured(&self) -> bool {
        !self.kind.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// Validate the tracker section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue(format!(
                "issue tracker url '{}' must start with http:// or https://",
                url
            )));
        }
        Ok(())
    }
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// interactive = true
/// credentials_file = "/home/me/.tracklink/credentials.toml"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default interactive mode
    pub interactive: Option<bool>,

    /// Location of the credentials file
    pub credentials_file: Option<PathBuf>,
}
