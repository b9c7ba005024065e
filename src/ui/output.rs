//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! User-facing output is formatted consistently and respects the quiet flag.
//! Diagnostics go through `tracing` instead.

use std::fmt::Display;

use crate::issues::Issue;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format a single issue as a one-line summary.
pub fn format_issue(issue: &Issue) -> String {
    let mut line = format!("{:<12} {:<8} {}", issue.key, issue.state, issue.title);
    if !issue.labels.is_empty() {
        line.push_str(&format!(" [{}]", issue.labels.join(", ")));
    }
    line
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
