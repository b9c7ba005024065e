//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Prompter capability (interactive and batch)
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All output and prompts go through this module to ensure consistent
//! formatting and proper handling of interactive vs batch modes.

pub mod output;
pub mod prompts;
