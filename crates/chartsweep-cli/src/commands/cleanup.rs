//! Cleanup command - change-based deletion addressed by owner and repo,
//! or a full index wipe with `--all`

use std::sync::Arc;

use chartsweep_repo::{PagesPublisher, RepoSlug, ReleaseManager};

use crate::commands::{ChangedArgs, GlobalArgs, github_client, open_git, run_delete_changed};
use crate::display;
use crate::error::{CliError, Result};

pub async fn run(
    global: &GlobalArgs,
    owner: &str,
    repo: &str,
    args: &ChangedArgs,
    all: bool,
) -> Result<()> {
    if owner.is_empty() || repo.is_empty() || owner.contains('/') || repo.contains('/') {
        return Err(CliError::usage(
            format!("Invalid repository '{owner}/{repo}'"),
            "Pass the owner and the repository name separately",
        ));
    }
    let slug = RepoSlug::from_parts(owner, repo);

    if all {
        wipe_index(global, slug, &args.pages_branch).await
    } else {
        run_delete_changed(global, slug, args).await
    }
}

/// Remove every index entry, keeping releases and tags
///
/// The version pattern does not apply here.
async fn wipe_index(global: &GlobalArgs, slug: RepoSlug, pages_branch: &str) -> Result<()> {
    let span = tracing::info_span!("cleanup_all", repository = %slug);
    let client = github_client(global, slug, &span)?;
    let git = open_git(global, &span)?;

    let pages = PagesPublisher::new(git, pages_branch)
        .with_span(tracing::info_span!(parent: &span, "pages"));
    let manager = ReleaseManager::new(Arc::new(client), pages).with_span(span.clone());

    let update = manager.clean_index().await?;
    display::print_index_update(&update);
    Ok(())
}
