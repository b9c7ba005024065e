//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt (batch mode)
//! - `--quiet` / `-q`: Minimal output
//! - `--credentials <path>`: Credentials file to read

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// tracklink - find and use the issue tracker of a project
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tl was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts (batch mode)
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Credentials file to read instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// `configured` is the global config's `interactive` setting. Flags win,
    /// then the setting, then whether stdin is a terminal.
    pub fn interactive(&self, configured: Option<bool>) -> bool {
        if self.no_interactive || self.quiet {
            false
        } else {
            configured.unwrap_or_else(|| std::io::stdin().is_terminal())
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show or set the project's issue tracker
    #[command(
        name = "tracker",
        long_about = "Show or set the issue tracker used for this project.\n\n\
            An issue tracker configured in .tracklink/config.toml always wins. \
            Without one, the issues of the git hosting service behind the \
            repository's upstream remote are used.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Which tracker would be used here?
    tl tracker show

    # Use a Jira project
    tl tracker set --kind jira --url https://jira.example.com --project ABC"
    )]
    Tracker {
        #[command(subcommand)]
        action: TrackerAction,
    },

    /// Work with issues
    #[command(
        name = "issue",
        after_help = "\
WORKFLOW EXAMPLES:
    # Look at an issue, or open it in the browser
    tl issue get ABC-12
    tl issue get ABC-12 --web

    # List open issues
    tl issue list

    # File a bug
    tl issue create --title \"Build is red\" --label ci"
    )]
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    tl completion bash > ~/.local/share/bash-completion/completions/tl

    # Zsh
    tl completion zsh > \"${fpath[1]}/_tl\"

    # Fish
    tl completion fish > ~/.config/fish/completions/tl.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Tracker subcommands.
#[derive(Subcommand, Debug)]
pub enum TrackerAction {
    /// Resolve the tracker and print its kind and home URL
    Show,

    /// Write the issue tracker section of the project config
    Set {
        /// Tracker kind (jira, github)
        #[arg(long)]
        kind: String,

        /// Tracker server URL
        #[arg(long)]
        url: String,

        /// Tracker project (Jira key or owner/repo)
        #[arg(long, default_value = "")]
        project: String,
    },
}

/// Issue subcommands.
#[derive(Subcommand, Debug)]
pub enum IssueAction {
    /// Show one issue
    Get {
        /// Issue key (e.g., ABC-12 or 42)
        key: String,

        /// Open the issue in the browser instead
        #[arg(long)]
        web: bool,
    },

    /// List issues
    List {
        /// Tracker-specific query (JQL or GitHub search qualifiers)
        #[arg(long)]
        query: Option<String>,
    },

    /// Create an issue
    Create {
        /// Issue title
        #[arg(long)]
        title: String,

        /// Issue description
        #[arg(long)]
        body: Option<String>,

        /// Label to apply (repeatable)
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue key
        key: String,

        /// Comment text
        body: String,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
