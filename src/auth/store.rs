//! auth::store
//!
//! Credential store handle and the builder that assembles it.
//!
//! # Sources
//!
//! [`LocalCredentialStore`] combines:
//! 1. the credentials file (read-only, TOML, see [`AuthConfig`])
//! 2. cluster secrets, when the caller has them
//!
//! Secrets override file entries for the same server and username.
//!
//! # Security
//!
//! - The file is never written by tracklink
//! - On Unix a warning is logged when the file is readable by others
//! - Token values never appear in logs or error messages

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::{debug, warn};

use super::config::AuthConfig;
use super::errors::AuthError;
use super::secrets::servers_from_secrets;
use crate::cluster::ClusterSecret;
use crate::core::config::GlobalConfig;

/// Environment variable overriding the credentials file location.
pub const CREDENTIALS_ENV: &str = "TRACKLINK_CREDENTIALS";

/// Handle to an assembled credential registry.
#[derive(Debug, Clone, Default)]
pub struct AuthConfigService {
    config: AuthConfig,
    source: Option<PathBuf>,
}

impl AuthConfigService {
    /// Wrap a registry.
    pub fn new(config: AuthConfig, source: Option<PathBuf>) -> Self {
        Self { config, source }
    }

    /// The credential registry.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Mutable access to the credential registry.
    pub fn config_mut(&mut self) -> &mut AuthConfig {
        &mut self.config
    }

    /// Consume the handle, returning the registry.
    pub fn into_config(self) -> AuthConfig {
        self.config
    }

    /// The credentials file that was read, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Builds a credential store handle from optional cluster secrets.
///
/// `None` means no secrets are available; the builder must still try to
/// produce a usable handle.
pub trait CredentialStoreBuilder: Send + Sync {
    fn build(&self, secrets: Option<&[ClusterSecret]>) -> Result<AuthConfigService, AuthError>;
}

/// Credential store backed by a local TOML file plus cluster secrets.
#[derive(Debug, Clone, Default)]
pub struct LocalCredentialStore {
    path: Option<PathBuf>,
}

impl LocalCredentialStore {
    /// Create a store reading from `path`, or from no file at all.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Resolve the credentials file location.
    ///
    /// Precedence: `explicit`, `$TRACKLINK_CREDENTIALS`, the global config's
    /// `credentials_file`, then `~/.tracklink/credentials.toml`.
    pub fn locate(explicit: Option<PathBuf>, global: &GlobalConfig) -> Self {
        let path = explicit
            .or_else(|| std::env::var_os(CREDENTIALS_ENV).map(PathBuf::from))
            .or_else(|| global.credentials_file.clone())
            .or_else(Self::default_path);
        Self { path }
    }

    /// Default credentials file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".tracklink").join("credentials.toml"))
    }

    /// The credentials file this store reads.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the credentials file.
    ///
    /// A missing file yields an empty registry.
    fn read_file(&self) -> Result<AuthConfig, AuthError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(AuthConfig::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no credentials file");
            return Ok(AuthConfig::default());
        }

        warn_if_world_readable(path);

        let content = fs::read_to_string(path).map_err(|e| AuthError::CredentialsFile {
            path: path.to_path_buf(),
            message: format!("cannot read file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| AuthError::CredentialsFile {
            path: path.to_path_buf(),
            message: format!("cannot parse file: {}", e),
        })
    }
}

impl CredentialStoreBuilder for LocalCredentialStore {
    fn build(&self, secrets: Option<&[ClusterSecret]>) -> Result<AuthConfigService, AuthError> {
        let mut config = self.read_file()?;

        if let Some(secrets) = secrets {
            let servers = servers_from_secrets(secrets);
            debug!(
                secrets = secrets.len(),
                servers = servers.len(),
                "merging credentials from cluster secrets"
            );
            for server in servers {
                config.merge_server(server);
            }
        }

        let source = self.path.clone().filter(|p| p.exists());
        Ok(AuthConfigService::new(config, source))
    }
}

/// Log a warning when the credentials file is accessible by others (Unix only).
#[cfg(unix)]
fn warn_if_world_readable(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "credentials file is accessible by other users; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_world_readable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secrets::{KIND_ISSUE_TRACKER, KIND_LABEL, URL_ANNOTATION};
    use tempfile::TempDir;

    const FILE: &str = r#"
        default_username = "alice"

        [[servers]]
        url = "https://jira.example.com"
        kind = "jira"
        current_user = "alice"

        [[servers.users]]
        username = "alice"
        api_token = "from-file"
    "#;

    fn store_with(content: Option<&str>) -> (TempDir, LocalCredentialStore) {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("credentials.toml");
        if let Some(content) = content {
            fs::write(&path, content).expect("write credentials");
        }
        (temp, LocalCredentialStore::new(Some(path)))
    }

    #[test]
    fn missing_file_is_empty() {
        let (_temp, store) = store_with(None);
        let service = store.build(None).unwrap();
        assert!(service.config().is_empty());
        assert!(service.source().is_none());
    }

    #[test]
    fn no_path_is_empty() {
        let service = LocalCredentialStore::new(None).build(None).unwrap();
        assert!(service.config().is_empty());
    }

    #[test]
    fn reads_file() {
        let (_temp, store) = store_with(Some(FILE));
        let service = store.build(None).unwrap();

        let server = service.config().find_server("https://jira.example.com").unwrap();
        assert_eq!(server.kind, "jira");
        assert_eq!(server.users[0].api_token, "from-file");
        assert_eq!(service.config().default_username.as_deref(), Some("alice"));
        assert_eq!(service.source(), store.path());
    }

    #[test]
    fn secrets_override_file_users() {
        let (_temp, store) = store_with(Some(FILE));
        let secret = ClusterSecret::new("jira")
            .with_label(KIND_LABEL, KIND_ISSUE_TRACKER)
            .with_annotation(URL_ANNOTATION, "https://jira.example.com/")
            .with_data("username", "alice")
            .with_data("password", "from-secret");

        let service = store.build(Some(&[secret])).unwrap();
        let server = service.config().find_server("https://jira.example.com").unwrap();
        assert_eq!(server.users.len(), 1);
        assert_eq!(server.users[0].api_token, "from-secret");
    }

    #[test]
    fn malformed_file_is_error() {
        let (_temp, store) = store_with(Some("[[servers]\nurl = "));
        let err = store.build(None).unwrap_err();
        match err {
            AuthError::CredentialsFile { message, .. } => assert!(message.contains("cannot parse")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn explicit_path_wins() {
        let global = GlobalConfig {
            credentials_file: Some(PathBuf::from("/from/global.toml")),
            ..Default::default()
        };
        let store = LocalCredentialStore::locate(Some(PathBuf::from("/explicit.toml")), &global);
        assert_eq!(store.path(), Some(Path::new("/explicit.toml")));
    }
}
