//! auth::errors
//!
//! Credential error types.
//!
//! # Design
//!
//! Error messages MUST NOT contain tokens. Variants carry the server URL
//! or file path under inspection so the user can tell which setup is missing.
//!
//! # Example
//!
//! ```
//! use tracklink::auth::AuthError;
//!
//! let err = AuthError::NoCredentials("https://jira.example.com".to_string());
//! assert!(err.to_string().contains("https://jira.example.com"));
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::ui::prompts::PromptError;

/// Errors from credential operations.
///
/// # Security
///
/// Error messages intentionally do not include token values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The credentials file exists but cannot be read or parsed.
    #[error("failed to load credentials file '{path}': {message}")]
    CredentialsFile {
        /// Path of the credentials file
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// No credentials are stored for the server and prompting is disabled.
    #[error("no credentials stored for '{0}' and prompting is disabled (batch mode)")]
    NoCredentials(String),

    /// Several users are stored for the server and none can be chosen.
    #[error("{users} users are stored for '{server}' and none is marked current; cannot choose in batch mode")]
    AmbiguousUser {
        /// The server URL
        server: String,
        /// Number of candidate users
        users: usize,
    },

    /// A credential, stored or entered, lacks a username or token.
    #[error("empty username or token for '{0}'")]
    EmptyCredential(String),

    /// A prompt failed for a reason other than batch mode.
    #[error("failed to prompt for credentials for '{server}': {source}")]
    Prompt {
        /// The server URL
        server: String,
        /// The prompt failure
        #[source]
        source: PromptError,
    },
}
