//! Delete-all command - remove every release of a repository

use std::sync::Arc;

use chartsweep_repo::{DeleteAllOptions, Git, PagesPublisher, Release, ReleaseManager};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;

use crate::commands::{GlobalArgs, github_client, open_git, parse_slug};
use crate::display;
use crate::error::{CliError, Result};

/// Run the delete-all command
pub async fn run(
    global: &GlobalArgs,
    repository: &str,
    options: DeleteAllOptions,
    pages_branch: &str,
) -> Result<()> {
    let slug = parse_slug(repository)?;
    let span = tracing::info_span!("delete_all", repository = %slug);
    let client = github_client(global, slug, &span)?;

    // The working copy only matters when the index is cleaned
    let git = if options.clean_index {
        open_git(global, &span)?
    } else {
        Git::new(&global.workdir)
    };

    let pages = PagesPublisher::new(git, pages_branch)
        .with_span(tracing::info_span!(parent: &span, "pages"));
    let manager = ReleaseManager::new(Arc::new(client), pages).with_span(span.clone());

    let report = manager
        .delete_all(options, |releases| confirm(releases, &options))
        .await?;
    display::print_delete_all_summary(&report);

    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: report.failures.len(),
        });
    }
    Ok(())
}

/// Show what will be deleted and ask; anything but an explicit yes cancels
fn confirm(releases: &[Release], options: &DeleteAllOptions) -> bool {
    display::print_release_preview(releases, options);

    match Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Are you sure you want to delete these releases?")
        .default(false)
        .interact()
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot ask for confirmation, pass --force to skip it");
            false
        }
    }
}
