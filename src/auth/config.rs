//! auth::config
//!
//! In-memory credential registry keyed by server URL.
//!
//! # Design
//!
//! An [`AuthConfig`] holds one [`AuthServer`] per server URL, each with the
//! [`UserAuth`] entries known for it. Server URLs are normalized before
//! comparison so `https://Jira.example.com/` and `https://jira.example.com`
//! are the same server.
//!
//! Picking a user never writes anything back: credentials entered at a
//! prompt live only for the current call.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::AuthError;
use crate::ui::prompts::{PromptError, Prompter};

/// A username and API token for one server.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserAuth {
    /// Login name
    pub username: String,
    /// API token or password
    pub api_token: String,
}

impl UserAuth {
    /// Create a credential.
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    /// Whether both username and token are present.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.api_token.is_empty()
    }
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for UserAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAuth")
            .field("username", &self.username)
            .field("has_token", &!self.api_token.is_empty())
            .finish()
    }
}

/// Credentials registered for one server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthServer {
    /// Server URL
    pub url: String,
    /// Display name
    pub name: String,
    /// Server kind (e.g., "jira", "github")
    pub kind: String,
    /// Known users
    pub users: Vec<UserAuth>,
    /// Username to use when several are known
    pub current_user: Option<String>,
}

impl AuthServer {
    /// Create a server entry without users.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Name for messages: the display name, or the URL.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    /// Find a user by name.
    pub fn find_user(&self, username: &str) -> Option<&UserAuth> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Add a user, replacing any entry with the same username.
    pub fn upsert_user(&mut self, user: UserAuth) {
        match self.users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    /// The current user, if it names a known user.
    pub fn current_user_auth(&self) -> Option<&UserAuth> {
        self.current_user
            .as_deref()
            .and_then(|name| self.find_user(name))
    }
}

/// Credential registry.
///
/// # Example
///
/// ```toml
/// default_username = "alice"
///
/// [[servers]]
/// url = "https://jira.example.com"
/// kind = "jira"
///
/// [[servers.users]]
/// username = "alice"
/// api_token = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Registered servers
    pub servers: Vec<AuthServer>,
    /// Username suggested when prompting
    pub default_username: Option<String>,
}

impl AuthConfig {
    /// Whether no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Find a server by URL.
    pub fn find_server(&self, url: &str) -> Option<&AuthServer> {
        let key = normalize_server_url(url);
        self.servers
            .iter()
            .find(|s| normalize_server_url(&s.url) == key)
    }

    /// Get the entry for a server URL, creating an empty one if needed.
    pub fn get_or_create_server(&mut self, url: &str) -> &mut AuthServer {
        let key = normalize_server_url(url);
        let index = match self
            .servers
            .iter()
            .position(|s| normalize_server_url(&s.url) == key)
        {
            Some(i) => i,
            None => {
                debug!(url = %key, "registering new credential server");
                self.servers.push(AuthServer::new(key));
                self.servers.len() - 1
            }
        };
        &mut self.servers[index]
    }

    /// Merge a server entry into the registry.
    ///
    /// Users from `server` replace users with the same name; metadata is
    /// only filled in where the existing entry has none.
    pub fn merge_server(&mut self, server: AuthServer) {
        let existing = self.get_or_create_server(&server.url);
        if existing.name.is_empty() {
            existing.name = server.name;
        }
        if existing.kind.is_empty() {
            existing.kind = server.kind;
        }
        if existing.current_user.is_none() {
            existing.current_user = server.current_user;
        }
        for user in server.users {
            existing.upsert_user(user);
        }
    }

    /// Pick the user credential to use for `server`.
    ///
    /// - exactly one user: that user
    /// - several users: the current user, otherwise a selection prompt
    /// - no users: prompt for a username and token
    ///
    /// # Errors
    ///
    /// [`AuthError::EmptyCredential`] when the chosen credential lacks a
    /// username or token.
    ///
    /// In batch mode, [`AuthError::NoCredentials`] when nothing is stored and
    /// [`AuthError::AmbiguousUser`] when the choice is not obvious.
    pub fn pick_server_user_auth(
        &self,
        server: &AuthServer,
        message: &str,
        prompter: &dyn Prompter,
    ) -> Result<UserAuth, AuthError> {
        match server.users.as_slice() {
            [only] => return stored_user(server, only),
            [] => return self.prompt_user_auth(server, message, prompter),
            _ => {}
        }

        if let Some(current) = server.current_user_auth() {
            return stored_user(server, current);
        }

        let names: Vec<String> = server.users.iter().map(|u| u.username.clone()).collect();
        let default = self
            .default_username
            .as_deref()
            .and_then(|d| names.iter().position(|n| n == d));

        let index = prompter
            .select(&format!("{} ({})", message, server.label()), &names, default)
            .map_err(|e| match e {
                PromptError::NotInteractive => AuthError::AmbiguousUser {
                    server: server.url.clone(),
                    users: names.len(),
                },
                other => AuthError::Prompt {
                    server: server.url.clone(),
                    source: other,
                },
            })?;

        let user = server.users.get(index).ok_or_else(|| AuthError::Prompt {
            server: server.url.clone(),
            source: PromptError::Cancelled,
        })?;
        stored_user(server, user)
    }

    /// Prompt for a new credential for `server`.
    fn prompt_user_auth(
        &self,
        server: &AuthServer,
        message: &str,
        prompter: &dyn Prompter,
    ) -> Result<UserAuth, AuthError> {
        if !prompter.is_interactive() {
            return Err(AuthError::NoCredentials(server.url.clone()));
        }

        let map_prompt = |e: PromptError| match e {
            PromptError::NotInteractive => AuthError::NoCredentials(server.url.clone()),
            other => AuthError::Prompt {
                server: server.url.clone(),
                source: other,
            },
        };

        let username = prompter
            .input(
                &format!("{} ({})", message, server.label()),
                self.default_username.as_deref(),
            )
            .map_err(map_prompt)?;
        let api_token = prompter
            .password(&format!("API token for {} at {}", username, server.url))
            .map_err(map_prompt)?;

        let user = UserAuth::new(username.trim(), api_token.trim());
        if !user.is_complete() {
            return Err(AuthError::EmptyCredential(server.url.clone()));
        }
        Ok(user)
    }
}

/// A stored user is only usable with both a username and a token.
fn stored_user(server: &AuthServer, user: &UserAuth) -> Result<UserAuth, AuthError> {
    if !user.is_complete() {
        return Err(AuthError::EmptyCredential(server.url.clone()));
    }
    Ok(user.clone())
}

/// Normalize a server URL for comparison.
///
/// Trims whitespace and trailing slashes and lower-cases the scheme and host.
pub fn normalize_server_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = match rest.find('/') {
                Some(i) => rest.split_at(i),
                None => (rest, ""),
            };
            format!(
                "{}://{}{}",
                scheme.to_lowercase(),
                host.to_lowercase(),
                path
            )
        }
        None => url.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::prompts::BatchPrompter;
    use std::sync::Mutex;

    /// Prompter returning scripted answers.
    struct ScriptedPrompter {
        inputs: Mutex<Vec<String>>,
        selection: Option<usize>,
    }

    impl ScriptedPrompter {
        fn new(inputs: &[&str], selection: Option<usize>) -> Self {
            Self {
                inputs: Mutex::new(inputs.iter().rev().map(|s| s.to_string()).collect()),
                selection,
            }
        }

        fn next(&self) -> Result<String, PromptError> {
            self.inputs
                .lock()
                .unwrap()
                .pop()
                .ok_or(PromptError::Cancelled)
        }
    }

    impl Prompter for ScriptedPrompter {
        fn is_interactive(&self) -> bool {
            true
        }

        fn input(&self, _message: &str, _default: Option<&str>) -> Result<String, PromptError> {
            self.next()
        }

        fn password(&self, _message: &str) -> Result<String, PromptError> {
            self.next()
        }

        fn select(
            &self,
            _message: &str,
            _options: &[String],
            _default: Option<usize>,
        ) -> Result<usize, PromptError> {
            self.selection.ok_or(PromptError::Cancelled)
        }
    }

    fn server_with(users: &[(&str, &str)]) -> AuthServer {
        let mut server = AuthServer::new("https://jira.example.com");
        for (name, token) in users {
            server.users.push(UserAuth::new(*name, *token));
        }
        server
    }

    mod registry {
        use super::*;

        #[test]
        fn get_or_create_is_idempotent() {
            let mut config = AuthConfig::default();
            config.get_or_create_server("https://jira.example.com/");
            config.get_or_create_server("HTTPS://JIRA.example.com");

            assert_eq!(config.servers.len(), 1);
            assert_eq!(config.servers[0].url, "https://jira.example.com");
        }

        #[test]
        fn find_server_normalizes() {
            let mut config = AuthConfig::default();
            config.servers.push(AuthServer::new("https://Jira.Example.com/"));

            assert!(config.find_server("https://jira.example.com").is_some());
            assert!(config.find_server("https://other.example.com").is_none());
        }

        #[test]
        fn merge_replaces_same_user_and_keeps_metadata() {
            let mut config = AuthConfig::default();
            let mut existing = server_with(&[("alice", "old")]);
            existing.kind = "jira".into();
            config.servers.push(existing);

            let mut incoming = server_with(&[("alice", "new"), ("bob", "b")]);
            incoming.kind = "other".into();
            incoming.name = "Example Jira".into();
            config.merge_server(incoming);

            let server = config.find_server("https://jira.example.com").unwrap();
            assert_eq!(server.kind, "jira");
            assert_eq!(server.name, "Example Jira");
            assert_eq!(server.users.len(), 2);
            assert_eq!(server.find_user("alice").unwrap().api_token, "new");
        }

        #[test]
        fn normalize_keeps_path_case() {
            assert_eq!(
                normalize_server_url(" HTTPS://Git.Example.com/Jira/ "),
                "https://git.example.com/Jira"
            );
        }
    }

    mod pick_server_user_auth {
        use super::*;

        const MSG: &str = "user to access the issue tracker";

        #[test]
        fn single_user_is_used_in_batch_mode() {
            let server = server_with(&[("alice", "t1")]);
            let user = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &BatchPrompter)
                .unwrap();
            assert_eq!(user.username, "alice");
        }

        #[test]
        fn single_user_without_token_is_rejected() {
            let server = server_with(&[("alice", "")]);
            let err = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &BatchPrompter)
                .unwrap_err();
            assert!(matches!(err, AuthError::EmptyCredential(ref url) if url == "https://jira.example.com"));
        }

        #[test]
        fn selected_user_without_token_is_rejected() {
            let server = server_with(&[("alice", "t1"), ("bob", "")]);
            let prompter = ScriptedPrompter::new(&[], Some(1));
            let err = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &prompter)
                .unwrap_err();
            assert!(matches!(err, AuthError::EmptyCredential(_)));
        }

        #[test]
        fn current_user_wins_over_prompt() {
            let mut server = server_with(&[("alice", "t1"), ("bob", "t2")]);
            server.current_user = Some("bob".into());
            let user = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &BatchPrompter)
                .unwrap();
            assert_eq!(user.username, "bob");
        }

        #[test]
        fn several_users_in_batch_mode_is_ambiguous() {
            let server = server_with(&[("alice", "t1"), ("bob", "t2")]);
            let err = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &BatchPrompter)
                .unwrap_err();
            assert!(matches!(err, AuthError::AmbiguousUser { users: 2, .. }));
        }

        #[test]
        fn several_users_interactive_uses_selection() {
            let server = server_with(&[("alice", "t1"), ("bob", "t2")]);
            let prompter = ScriptedPrompter::new(&[], Some(1));
            let user = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &prompter)
                .unwrap();
            assert_eq!(user.username, "bob");
        }

        #[test]
        fn no_users_in_batch_mode_fails() {
            let server = server_with(&[]);
            let err = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &BatchPrompter)
                .unwrap_err();
            assert!(matches!(err, AuthError::NoCredentials(ref url) if url == "https://jira.example.com"));
        }

        #[test]
        fn no_users_interactive_prompts() {
            let server = server_with(&[]);
            let prompter = ScriptedPrompter::new(&[" carol ", "secret"], None);
            let user = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &prompter)
                .unwrap();
            assert_eq!(user, UserAuth::new("carol", "secret"));
        }

        #[test]
        fn empty_token_rejected() {
            let server = server_with(&[]);
            let prompter = ScriptedPrompter::new(&["carol", ""], None);
            let err = AuthConfig::default()
                .pick_server_user_auth(&server, MSG, &prompter)
                .unwrap_err();
            assert!(matches!(err, AuthError::EmptyCredential(_)));
        }
    }

    #[test]
    fn debug_does_not_expose_token() {
        let user = UserAuth::new("alice", "super_secret_token");
        let debug_output = format!("{:?}", user);
        assert!(!debug_output.contains("super_secret_token"));
        assert!(debug_output.contains("has_token"));
    }
}
