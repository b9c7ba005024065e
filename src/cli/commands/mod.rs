//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! Issue commands talk to remote trackers. Each one creates a tokio
//! runtime and blocks on the async provider call; resolution itself is
//! synchronous.

mod completion;
mod issue;
mod tracker;

pub use completion::completion;
pub use issue::{comment as issue_comment, create as issue_create, get as issue_get, list as issue_list};
pub use tracker::{set as tracker_set, show as tracker_show};

use anyhow::Result;

use super::args::{Command, IssueAction, TrackerAction};
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Tracker { action } => match action {
            TrackerAction::Show => tracker::show(ctx),
            TrackerAction::Set { kind, url, project } => tracker::set(ctx, &kind, &url, &project),
        },
        Command::Issue { action } => match action {
            IssueAction::Get { key, web } => issue::get(ctx, &key, web),
            IssueAction::List { query } => issue::list(ctx, query.as_deref()),
            IssueAction::Create {
                title,
                body,
                labels,
            } => issue::create(ctx, title, body, labels),
            IssueAction::Comment { key, body } => issue::comment(ctx, &key, &body),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
