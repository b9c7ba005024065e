//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompting is a capability passed to the code that needs it, rather than
//! a global flag. In batch mode a [`BatchPrompter`] is handed out and every
//! prompt fails with [`PromptError::NotInteractive`], so operations requiring
//! user input must either succeed from stored state or fail with a clear
//! error message.

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Source of user input.
pub trait Prompter: Send + Sync {
    /// Whether prompts can be answered.
    fn is_interactive(&self) -> bool;

    /// Prompt for text input.
    ///
    /// An empty answer yields `default` when one is given.
    fn input(&self, message: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Prompt for masked input (e.g., passwords, tokens).
    fn password(&self, message: &str) -> Result<String, PromptError>;

    /// Prompt to select from a list of options.
    ///
    /// Returns the index of the selected option.
    fn select(
        &self,
        message: &str,
        options: &[String],
        default: Option<usize>,
    ) -> Result<usize, PromptError>;
}

/// Prompter for batch mode. Every prompt fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchPrompter;

impl Prompter for BatchPrompter {
    fn is_interactive(&self) -> bool {
        false
    }

    fn input(&self, _message: &str, _default: Option<&str>) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn password(&self, _message: &str) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn select(
        &self,
        _message: &str,
        _options: &[String],
        _default: Option<usize>,
    ) -> Result<usize, PromptError> {
        Err(PromptError::NotInteractive)
    }
}

/// Prompter reading from the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(message);
        if let Some(d) = default {
            input = input.default(d.to_string());
        }
        input
            .interact_text()
            .map(|s| s.trim().to_string())
            .map_err(PromptError::from)
    }

    fn password(&self, message: &str) -> Result<String, PromptError> {
        rpassword::prompt_password(format!("{}: ", message))
            .map(|s| s.trim().to_string())
            .map_err(|e| PromptError::IoError(e.to_string()))
    }

    fn select(
        &self,
        message: &str,
        options: &[String],
        default: Option<usize>,
    ) -> Result<usize, PromptError> {
        if options.is_empty() {
            return Err(PromptError::Cancelled);
        }

        let theme = ColorfulTheme::default();
        let mut select = Select::with_theme(&theme).with_prompt(message).items(options);
        if let Some(d) = default.filter(|d| *d < options.len()) {
            select = select.default(d);
        }
        // Esc or q yields None
        select
            .interact_opt()
            .map_err(PromptError::from)?
            .ok_or(PromptError::Cancelled)
    }
}

impl From<dialoguer::Error> for PromptError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => PromptError::Cancelled,
            other => PromptError::IoError(other.to_string()),
        }
    }
}

/// Choose the prompter for the given mode.
pub fn prompter_for(interactive: bool) -> Box<dyn Prompter> {
    if interactive {
        Box::new(TerminalPrompter)
    } else {
        Box::new(BatchPrompter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_prompter_refuses_everything() {
        let p = BatchPrompter;
        assert!(!p.is_interactive());
        assert!(matches!(
            p.input("user", Some("alice")),
            Err(PromptError::NotInteractive)
        ));
        assert!(matches!(
            p.password("token"),
            Err(PromptError::NotInteractive)
        ));
        assert!(matches!(
            p.select("pick", &["a".to_string()], Some(0)),
            Err(PromptError::NotInteractive)
        ));
    }

    #[test]
    fn prompter_for_mode() {
        assert!(prompter_for(true).is_interactive());
        assert!(!prompter_for(false).is_interactive());
    }

    #[test]
    fn interrupted_terminal_is_cancelled() {
        let err = dialoguer::Error::IO(io::Error::new(io::ErrorKind::Interrupted, "ctrl-c"));
        assert_eq!(PromptError::from(err), PromptError::Cancelled);

        let err = dialoguer::Error::IO(io::Error::new(io::ErrorKind::NotConnected, "no tty"));
        assert!(matches!(PromptError::from(err), PromptError::IoError(m) if m.contains("no tty")));
    }

    #[test]
    fn terminal_select_without_options_is_cancelled() {
        assert_eq!(TerminalPrompter.select("pick", &[], None), Err(PromptError::Cancelled));
    }
}
