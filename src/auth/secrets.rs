//! auth::secrets
//!
//! Turn cluster secrets into credential server entries.
//!
//! A secret is an issue tracker credential when it carries the label
//! `tracklink.io/kind=issue-tracker`. The server URL is read from the
//! `tracklink.io/url` annotation, the user from the `username` data key and
//! the token from `password` (or `token`). Secret values are never logged.

use std::collections::BTreeMap;

use tracing::debug;

use super::config::{normalize_server_url, AuthServer, UserAuth};
use crate::cluster::ClusterSecret;

/// Label selecting credential secrets.
pub const KIND_LABEL: &str = "tracklink.io/kind";

/// Value of [`KIND_LABEL`] for issue tracker credentials.
pub const KIND_ISSUE_TRACKER: &str = "issue-tracker";

/// Annotation holding the server URL.
pub const URL_ANNOTATION: &str = "tracklink.io/url";

/// Annotation holding the server kind (e.g., "jira").
pub const SERVICE_KIND_ANNOTATION: &str = "tracklink.io/service-kind";

/// Annotation holding the server display name.
pub const NAME_ANNOTATION: &str = "tracklink.io/name";

/// Extract issue tracker servers from a list of secrets.
///
/// Secrets for the same server are merged into one entry. Secrets without
/// a URL, username or token are skipped.
pub fn servers_from_secrets(secrets: &[ClusterSecret]) -> Vec<AuthServer> {
    let mut servers: BTreeMap<String, AuthServer> = BTreeMap::new();

    for secret in secrets {
        if secret.labels.get(KIND_LABEL).map(String::as_str) != Some(KIND_ISSUE_TRACKER) {
            continue;
        }

        let Some(url) = secret
            .annotations
            .get(URL_ANNOTATION)
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
        else {
            debug!(secret = %secret.name, "skipping credential secret without a server URL");
            continue;
        };

        let username = secret.data_str("username");
        let token = secret
            .data_str("password")
            .or_else(|| secret.data_str("token"));
        let (Some(username), Some(token)) = (username, token) else {
            debug!(secret = %secret.name, "skipping credential secret without username or token");
            continue;
        };

        let key = normalize_server_url(url);
        let server = servers
            .entry(key.clone())
            .or_insert_with(|| AuthServer::new(key));
        if server.kind.is_empty() {
            if let Some(kind) = secret.annotations.get(SERVICE_KIND_ANNOTATION) {
                server.kind = kind.clone();
            }
        }
        if server.name.is_empty() {
            if let Some(name) = secret.annotations.get(NAME_ANNOTATION) {
                server.name = name.clone();
            }
        }
        server.upsert_user(UserAuth::new(username, token));
    }

    servers.into_values().collect()
}
