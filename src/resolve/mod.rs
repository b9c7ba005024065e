//! resolve
//!
//! Issue provider resolution for a project directory.
//!
//! [`IssueProviderResolver::resolve`] is the single entry point commands
//! use to obtain an [`IssueProvider`](crate::issues::IssueProvider). An
//! explicitly configured tracker always wins; otherwise the repository's git
//! hosting service stands in.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracklink::auth::{CredentialStoreBuilder, LocalCredentialStore};
//! use tracklink::cluster::Disconnected;
//! use tracklink::git::Git2Metadata;
//! use tracklink::issues::DefaultIssueProviderFactory;
//! use tracklink::resolve::IssueProviderResolver;
//! use tracklink::ui::prompts::BatchPrompter;
//!
//! let store: Arc<dyn CredentialStoreBuilder> = Arc::new(LocalCredentialStore::new(None));
//! let resolver = IssueProviderResolver::new(
//!     Arc::new(Disconnected),
//!     Arc::clone(&store),
//!     Arc::new(Git2Metadata),
//!     Arc::new(DefaultIssueProviderFactory::new(store, None)),
//!     Arc::new(BatchPrompter),
//! );
//! let provider = resolver.resolve(std::path::Path::new("."))?;
//! println!("{}", provider.home_url());
//! ```

mod error;
mod fallback;
mod resolver;

pub use error::{MissingSetup, ResolveError};
pub use fallback::{FallbackError, GitFallbackDiscovery};
pub use resolver::{IssueProviderResolver, GIT_USER_PROMPT, TRACKER_USER_PROMPT};
