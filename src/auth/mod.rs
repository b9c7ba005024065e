//! auth - issue tracker credentials
//!
//! Credentials are kept per server URL. Each server may hold several users;
//! one of them may be marked current.
//!
//! # Sources
//!
//! - the local credentials file (`~/.tracklink/credentials.toml`)
//! - secrets from the cluster development namespace, labelled
//!   `tracklink.io/kind=issue-tracker`
//! - interactive prompts, when the session is interactive
//!
//! # Components
//!
//! - [`AuthConfig`] - the credential registry
//! - [`LocalCredentialStore`] - builds an [`AuthConfigService`] handle
//! - [`CredentialBootstrap`] - cluster bootstrap with local fallback
//!
//! # Security
//!
//! Tokens never appear in logs, error messages or debug output. Types
//! holding tokens implement a redacting `Debug`.

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod secrets;
pub mod store;

pub use bootstrap::{BootstrapError, BootstrapOutcome, CredentialBootstrap};
pub use config::{normalize_server_url, AuthConfig, AuthServer, UserAuth};
pub use errors::AuthError;
pub use secrets::{
    servers_from_secrets, KIND_ISSUE_TRACKER, KIND_LABEL, NAME_ANNOTATION,
    SERVICE_KIND_ANNOTATION, URL_ANNOTATION,
};
pub use store::{AuthConfigService, CredentialStoreBuilder, LocalCredentialStore, CREDENTIALS_ENV};
