//! tracklink - issue tracker resolution for project working directories
//!
//! Given a project directory, tracklink decides which issue tracker a build
//! tool should use and with which credentials: an explicitly configured
//! tracker (Jira, GitHub) when the project has one, otherwise the issues of
//! the git hosting service behind the repository's upstream remote.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (`tl`)
//! - [`resolve`] - The resolver deciding which provider serves a directory
//! - [`issues`] - Issue provider trait, Jira and GitHub implementations
//! - [`auth`] - Credential registry, credentials file, cluster bootstrap
//! - [`cluster`] - Narrow interface to the cluster secret store
//! - [`core`] - Project and global configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Prompts and output formatting
//!
//! # Invariants
//!
//! 1. A configured tracker is final; git is never consulted for it
//! 2. Malformed configuration is always an error, never a fallback trigger
//! 3. Batch mode never prompts
//! 4. Tokens never appear in logs, errors or debug output

pub mod auth;
pub mod cli;
pub mod cluster;
pub mod core;
pub mod git;
pub mod issues;
pub mod resolve;
pub mod ui;
