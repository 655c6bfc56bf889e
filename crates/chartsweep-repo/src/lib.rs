//! chartsweep Repository Management
//!
//! Everything that touches the outside world when cleaning up chart releases:
//!
//! - **Git**: change detection, pages-branch checkout, commit and push
//! - **GitHub releases**: list, delete by id or tag, delete tag refs
//! - **Chart index**: load, mutate and save `index.yaml`
//! - **Release manager**: the `delete-all` and `delete-changed` workflows
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chartsweep_core::{ChartScanner, VersionPolicy};
//! use chartsweep_repo::{
//!     ApiConfig, ChangeDetector, Git, GitHubClient, GitHubToken, PagesPublisher, ReleaseManager,
//!     RepoSlug,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let slug = RepoSlug::parse("acme/helm-charts")?;
//! let token = GitHubToken::from_env()?;
//! let client = GitHubClient::new(ApiConfig::default(), slug, token)?;
//!
//! let git = Git::discover(".")?;
//! let scanner = ChartScanner::new(git.workdir(), "charts", VersionPolicy::default());
//! let pages = PagesPublisher::new(git.clone(), "gh-pages");
//! let detector = ChangeDetector::new(git, scanner, "main");
//! let manager = ReleaseManager::new(Arc::new(client), pages);
//!
//! let report = manager.delete_changed(&detector).await?;
//! println!("deleted {} release(s)", report.releases_deleted.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety Notes
//!
//! - A changed chart whose version does not match the policy aborts the run
//!   before anything is deleted
//! - The original branch is restored after every pages-branch checkout, on
//!   success and on error

pub mod error;
pub mod config;
pub mod credentials;
pub mod index;
pub mod git;
pub mod pages;
pub mod github;
pub mod mock;
pub mod manager;

// Re-exports for convenience
pub use error::{RepoError, Result};
pub use config::{
    ApiConfig, DEFAULT_API_URL, DEFAULT_BASE_BRANCH, DEFAULT_CHART_DIR, DEFAULT_PAGES_BRANCH,
    RepoSlug,
};
pub use credentials::{GitHubToken, TOKEN_VARS};
pub use index::{CLEAR_INDEX_MESSAGE, ChartVersionEntry, INDEX_FILE, IndexDocument, IndexStore, RemovalReport};
pub use git::{Baseline, Git};
pub use pages::{IndexUpdate, PagesCheckout, PagesPublisher};
pub use github::{Deletion, GitHubClient, Release, ReleaseApi};
pub use mock::{MockReleaseApi, OperationCounts};
pub use manager::{
    ChangeDetector, ChangeSet, DeleteAllOptions, DeleteAllReport, DeleteChangedReport,
    FailedItem, ReleaseManager,
};
