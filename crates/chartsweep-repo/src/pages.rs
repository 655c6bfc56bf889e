//! Pages-branch index publishing
//!
//! The index lives on a separate branch of the same working copy. Editing it
//! means switching branches, so every edit runs inside a [`PagesCheckout`]
//! that puts the original branch back on every exit path.

use tracing::Span;

use crate::error::{RepoError, Result};
use crate::git::Git;
use crate::index::{INDEX_FILE, IndexDocument, IndexStore};

/// The pages branch checked out in place of the user's branch
///
/// Call [`restore`](Self::restore) to switch back and observe errors. If the
/// guard is dropped without it (early return, `?`, panic), the original
/// branch is restored on drop and failures are logged.
pub struct PagesCheckout<'a> {
    git: &'a Git,
    branch: String,
    original: String,
    restored: bool,
    span: Span,
}

impl<'a> PagesCheckout<'a> {
    /// Switch to the up-to-date pages branch
    ///
    /// Fails without leaving the original branch when the pages branch is
    /// missing on the remote, and restores it before failing when the branch
    /// has no index file.
    pub fn acquire(git: &'a Git, branch: &str, span: Span) -> Result<Self> {
        let current = git.current_branch()?;
        // Detached HEAD is restored by commit
        let original = if current == "HEAD" {
            git.head_commit()?
        } else {
            current
        };

        if !git.remote_branch_exists(branch)? {
            return Err(RepoError::PagesBranchMissing {
                branch: branch.to_string(),
            });
        }

        git.fetch_branch(branch)?;
        git.checkout(branch)?;

        let checkout = Self {
            git,
            branch: branch.to_string(),
            original,
            restored: false,
            span,
        };
        tracing::info!(parent: &checkout.span, branch, from = %checkout.original, "Checked out pages branch");

        if let Err(e) = git.pull_branch(branch) {
            tracing::warn!(parent: &checkout.span, branch, error = %e, "Could not pull pages branch");
        }

        if !checkout.store().exists() {
            return Err(RepoError::IndexMissing {
                branch: branch.to_string(),
                file: INDEX_FILE.to_string(),
            });
        }

        Ok(checkout)
    }

    /// Branch (or commit) that was checked out before
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The index file in the checked out pages branch
    pub fn store(&self) -> IndexStore {
        IndexStore::in_dir(self.git.workdir())
    }

    /// Switch back to the original branch
    pub fn restore(mut self) -> Result<()> {
        self.switch_back()
    }

    fn switch_back(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        // An uncommitted index edit would block the checkout
        if self.git.has_changes(INDEX_FILE)? {
            tracing::warn!(parent: &self.span, file = INDEX_FILE, "Discarding uncommitted index changes");
            self.git.discard_changes(INDEX_FILE)?;
        }

        self.git.checkout(&self.original)?;
        tracing::info!(parent: &self.span, branch = %self.original, from = %self.branch, "Restored original branch");
        Ok(())
    }
}

impl Drop for PagesCheckout<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.switch_back() {
            tracing::error!(
                parent: &self.span,
                branch = %self.original,
                error = %e,
                "Failed to restore original branch"
            );
        }
    }
}

/// Result of a pages-branch index edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexUpdate {
    /// Nothing changed, nothing committed
    Unchanged,
    /// The index was committed and pushed
    Committed { message: String },
}

impl IndexUpdate {
    pub fn is_committed(&self) -> bool {
        matches!(self, IndexUpdate::Committed { .. })
    }
}

/// Edits `index.yaml` on the pages branch
#[derive(Debug, Clone)]
pub struct PagesPublisher {
    git: Git,
    branch: String,
    span: Span,
}

impl PagesPublisher {
    pub fn new(git: Git, branch: impl Into<String>) -> Self {
        Self {
            git,
            branch: branch.into(),
            span: tracing::info_span!("pages"),
        }
    }

    /// Attach the span pages events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Load, edit and publish the index
    ///
    /// `mutate` returns the commit message when it changed the document, or
    /// `None` to leave the branch untouched. The original branch is restored
    /// whether the edit succeeds or fails.
    pub fn update_index<F>(&self, mutate: F) -> Result<IndexUpdate>
    where
        F: FnOnce(&mut IndexDocument) -> Result<Option<String>>,
    {
        let checkout = PagesCheckout::acquire(&self.git, &self.branch, self.span.clone())?;
        let store = checkout.store();

        let mut index = store.load()?;
        let update = match mutate(&mut index)? {
            None => {
                tracing::info!(parent: &self.span, "Index unchanged, nothing to commit");
                IndexUpdate::Unchanged
            }
            Some(message) => {
                store.save(&index)?;
                if self.git.has_changes(INDEX_FILE)? {
                    self.git.commit_and_push(INDEX_FILE, &message, &self.branch)?;
                    IndexUpdate::Committed { message }
                } else {
                    IndexUpdate::Unchanged
                }
            }
        };

        checkout.restore()?;
        Ok(update)
    }
}
