//! tracker command - Show or set the project's issue tracker
//!
//! # Example
//!
//! ```bash
//! tl tracker show
//! tl tracker set --kind jira --url https://jira.example.com --project ABC
//! ```

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{IssueTrackerConfig, ProjectConfig};
use crate::issues::IssueTrackerKind;
use crate::resolve::ResolveError;
use crate::ui::output;

/// Hint printed when nothing is set up.
const SETUP_HINT: &str = "configure one with `tl tracker set --kind <kind> --url <url> --project <project>`, \
or add an `upstream` or `origin` remote to the git repository";

/// Resolve the tracker for the current directory and describe it.
pub fn show(ctx: &Context) -> Result<()> {
    let provider = resolve(ctx)?;
    output::print(
        format!("{} {}", provider.kind(), provider.home_url()),
        ctx.verbosity,
    );
    Ok(())
}

/// Write the `[issue_tracker]` section of the project config.
pub fn set(ctx: &Context, kind: &str, url: &str, project: &str) -> Result<()> {
    let parsed = IssueTrackerKind::parse(kind)?;
    if !parsed.is_implemented() {
        bail!("{} issue trackers are not supported yet", parsed);
    }

    let mut config = ProjectConfig::load(&ctx.cwd)?
        .map(|loaded| loaded.config)
        .unwrap_or_default();
    config.issue_tracker = Some(IssueTrackerConfig::new(parsed.name(), url.trim(), project.trim()));

    let path = config
        .save(&ctx.cwd)
        .context("Failed to save project config")?;
    output::print(
        format!("Issue tracker set to {} {} in {}", parsed, url.trim(), path.display()),
        ctx.verbosity,
    );
    Ok(())
}

/// Resolve the provider, adding a setup hint when nothing is configured.
pub(super) fn resolve(ctx: &Context) -> Result<Box<dyn crate::issues::IssueProvider>> {
    let resolver = ctx.resolver();
    resolver.resolve(&ctx.cwd).map_err(|err: ResolveError| {
        if err.is_no_tracker_configured() {
            anyhow::Error::new(err).context(format!("Cannot find an issue tracker; {}", SETUP_HINT))
        } else {
            anyhow::Error::new(err)
        }
    })
}
