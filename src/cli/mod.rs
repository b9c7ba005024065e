//! cli
//!
//! Command-line interface layer for tracklink.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Build the [`Context`] and dispatch to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers obtain an issue provider through
//! [`Context::resolver`] and format the results; all resolution logic lives
//! in [`crate::resolve`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::auth::{CredentialStoreBuilder, LocalCredentialStore};
use crate::cluster::Disconnected;
use crate::core::config::GlobalConfig;
use crate::git::Git2Metadata;
use crate::issues::DefaultIssueProviderFactory;
use crate::resolve::IssueProviderResolver;
use crate::ui::output::Verbosity;
use crate::ui::prompts::prompter_for;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TRACKLINK_LOG";

/// Execution context shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory the command operates on
    pub cwd: PathBuf,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Whether prompts are allowed
    pub interactive: bool,
    /// Credentials file override from `--credentials`
    pub credentials: Option<PathBuf>,
    /// Global user configuration
    pub global: GlobalConfig,
}

impl Context {
    /// The local credential store for this invocation.
    pub fn credential_store(&self) -> LocalCredentialStore {
        LocalCredentialStore::locate(self.credentials.clone(), &self.global)
    }

    /// Build a resolver wired to the real collaborators.
    ///
    /// Nothing is read here; the credentials file is only opened once
    /// resolution needs it.
    pub fn resolver(&self) -> IssueProviderResolver {
        let store: Arc<dyn CredentialStoreBuilder> = Arc::new(self.credential_store());

        IssueProviderResolver::new(
            Arc::new(Disconnected),
            Arc::clone(&store),
            Arc::new(Git2Metadata),
            Arc::new(DefaultIssueProviderFactory::from_env(store)),
            Arc::from(prompter_for(self.interactive)),
        )
    }
}

/// Install the tracing subscriber.
///
/// The filter comes from `$TRACKLINK_LOG`, defaulting to `warn`; `--debug`
/// raises tracklink's own events to `debug`. Logs go to stderr.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warn,tracklink=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second initialization (e.g., in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let (global, global_path) = GlobalConfig::load().context("Failed to load global config")?;
    if let Some(path) = &global_path {
        debug!(path = %path.display(), "loaded global config");
    }

    let cwd = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let ctx = Context {
        cwd,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        interactive: cli.interactive(global.interactive),
        credentials: cli.credentials.clone(),
        global,
    };

    commands::dispatch(cli.command, &ctx)
}
