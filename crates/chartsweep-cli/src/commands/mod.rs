//! CLI command implementations

pub mod cleanup;
pub mod delete_all;
pub mod delete_release;

use std::path::PathBuf;
use std::sync::Arc;

use chartsweep_core::{ChartScanner, VersionPolicy};
use chartsweep_repo::{
    ApiConfig, ChangeDetector, Git, GitHubClient, GitHubToken, PagesPublisher, ReleaseManager,
    RepoSlug,
};
use tracing::Span;

use crate::display;
use crate::error::{CliError, Result};

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub workdir: PathBuf,
    pub api_url: String,
}

/// Options of the change-based deletion
#[derive(Debug, Clone)]
pub struct ChangedArgs {
    pub chart_dir: String,
    pub base_branch: String,
    pub pages_branch: String,
    pub version_pattern: String,
}

pub fn parse_slug(value: &str) -> Result<RepoSlug> {
    RepoSlug::parse(value).map_err(|e| {
        CliError::usage(e.to_string(), "Use the owner/repo form, e.g. acme/helm-charts")
    })
}

/// API client for `slug`, authenticated from the environment
pub fn github_client(global: &GlobalArgs, slug: RepoSlug, span: &Span) -> Result<GitHubClient> {
    let token = GitHubToken::from_env()?;
    let config = ApiConfig::with_base_url(&global.api_url)?;
    Ok(GitHubClient::new(config, slug, token)?.with_span(tracing::info_span!(parent: span, "github")))
}

pub fn open_git(global: &GlobalArgs, span: &Span) -> Result<Git> {
    Ok(Git::discover(&global.workdir)?.with_span(tracing::info_span!(parent: span, "git")))
}

/// Delete releases, tags and index entries of charts changed on the current
/// branch
pub async fn run_delete_changed(global: &GlobalArgs, slug: RepoSlug, args: &ChangedArgs) -> Result<()> {
    let span = tracing::info_span!("delete_changed", repository = %slug);
    let policy = VersionPolicy::new(&args.version_pattern)?;
    let client = github_client(global, slug, &span)?;
    let git = open_git(global, &span)?;

    let scanner = ChartScanner::new(git.workdir(), &args.chart_dir, policy)
        .with_span(tracing::info_span!(parent: &span, "scanner"));
    let pages = PagesPublisher::new(git.clone(), &args.pages_branch)
        .with_span(tracing::info_span!(parent: &span, "pages"));
    let detector = ChangeDetector::new(git, scanner, &args.base_branch)
        .with_span(tracing::info_span!(parent: &span, "changes"));
    let manager = ReleaseManager::new(Arc::new(client), pages).with_span(span.clone());

    let report = manager.delete_changed(&detector).await?;
    display::print_delete_changed_summary(&report);

    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: report.failures.len(),
        });
    }
    Ok(())
}
