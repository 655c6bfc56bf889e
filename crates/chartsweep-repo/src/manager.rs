//! Release cleanup workflows
//!
//! [`ReleaseManager`] ties change detection, the release API and the pages
//! index together. Failures on a single release or tag are recorded in the
//! report and the run carries on; anything that makes the run meaningless
//! (no access, policy violation, missing pages branch) aborts it.

use std::sync::Arc;

use chartsweep_core::{ChartInfo, ChartScanner};
use tracing::Span;

use crate::error::Result;
use crate::git::{Baseline, Git};
use crate::github::{Deletion, Release, ReleaseApi};
use crate::index::CLEAR_INDEX_MESSAGE;
use crate::pages::{IndexUpdate, PagesPublisher};

/// Options for [`ReleaseManager::delete_all`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteAllOptions {
    /// Skip the confirmation callback
    pub force: bool,
    /// Also delete each release's tag
    pub with_tags: bool,
    /// Also wipe every entry from the index
    pub clean_index: bool,
}

/// A release or tag that could not be deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// `release foo-1.0.0` or `tag foo-1.0.0`
    pub item: String,
    pub error: String,
}

impl FailedItem {
    fn new(kind: &str, name: &str, error: impl ToString) -> Self {
        Self {
            item: format!("{kind} {name}"),
            error: error.to_string(),
        }
    }
}

/// What [`ReleaseManager::delete_all`] did
#[derive(Debug, Clone, Default)]
pub struct DeleteAllReport {
    pub releases_found: usize,
    /// The confirmation was declined, nothing was deleted
    pub cancelled: bool,
    /// Tags of the deleted releases
    pub releases_deleted: Vec<String>,
    pub tags_deleted: Vec<String>,
    /// Set when the index was processed
    pub index: Option<IndexUpdate>,
    pub failures: Vec<FailedItem>,
}

impl DeleteAllReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What [`ReleaseManager::delete_changed`] did
#[derive(Debug, Clone, Default)]
pub struct DeleteChangedReport {
    pub baseline: Option<Baseline>,
    pub changed_files: usize,
    /// Charts selected for deletion
    pub charts: Vec<ChartInfo>,
    pub releases_deleted: Vec<String>,
    /// Releases that did not exist
    pub releases_missing: Vec<String>,
    pub tags_deleted: Vec<String>,
    /// Chart versions that were not in the index
    pub index_missing: Vec<ChartInfo>,
    pub index: Option<IndexUpdate>,
    pub failures: Vec<FailedItem>,
}

impl DeleteChangedReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Charts changed on the current branch, as found by [`ChangeDetector`]
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub baseline: Baseline,
    pub changed_files: usize,
    /// Changed charts, all matching the version policy
    pub charts: Vec<ChartInfo>,
}

/// Finds the charts changed since the branch's baseline
pub struct ChangeDetector {
    git: Git,
    scanner: ChartScanner,
    base_branch: String,
    span: Span,
}

impl ChangeDetector {
    pub fn new(git: Git, scanner: ChartScanner, base_branch: impl Into<String>) -> Self {
        Self {
            git,
            scanner,
            base_branch: base_branch.into(),
            span: tracing::info_span!("changes"),
        }
    }

    /// Attach the span detection events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Resolve the baseline, diff the chart directory and validate the charts
    ///
    /// Fails when a changed chart does not match the version policy.
    pub fn detect(&self) -> Result<ChangeSet> {
        let baseline = self.git.resolve_baseline(&self.base_branch)?;
        tracing::info!(parent: &self.span, %baseline, "Comparing against baseline");

        let files = self
            .git
            .changed_files(&baseline, &self.scanner.chart_dir())?;
        let mut changes = ChangeSet {
            baseline,
            changed_files: files.len(),
            charts: Vec::new(),
        };

        if files.is_empty() {
            tracing::info!(parent: &self.span, "No changed files found since the baseline");
            return Ok(changes);
        }
        tracing::info!(parent: &self.span, count = files.len(), "Found changed files");

        changes.charts = self.scanner.scan(&files)?;
        Ok(changes)
    }
}

/// Runs the cleanup workflows against one repository
pub struct ReleaseManager {
    api: Arc<dyn ReleaseApi>,
    pages: PagesPublisher,
    span: Span,
}

impl ReleaseManager {
    pub fn new(api: Arc<dyn ReleaseApi>, pages: PagesPublisher) -> Self {
        Self {
            api,
            pages,
            span: tracing::info_span!("manager"),
        }
    }

    /// Attach the span workflow events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Delete every release of the repository
    ///
    /// `confirm` sees the releases about to be deleted and is skipped when
    /// `options.force` is set. Returning `false` cancels the run. A failed
    /// index step is reported with the other failures so the deletions done
    /// so far still show up in the report.
    pub async fn delete_all<F>(&self, options: DeleteAllOptions, confirm: F) -> Result<DeleteAllReport>
    where
        F: FnOnce(&[Release]) -> bool,
    {
        self.api.verify_access().await?;

        let releases = self.api.list_releases().await?;
        let mut report = DeleteAllReport {
            releases_found: releases.len(),
            ..Default::default()
        };

        if releases.is_empty() {
            tracing::info!(parent: &self.span, "No releases found");
            return Ok(report);
        }

        if !options.force && !confirm(&releases) {
            tracing::info!(parent: &self.span, "Deletion cancelled");
            report.cancelled = true;
            return Ok(report);
        }

        tracing::info!(parent: &self.span, count = releases.len(), "Deleting releases");
        for release in &releases {
            let tag = release.tag_name.as_str();
            match self.api.delete_release(release.id).await {
                Ok(Deletion::Deleted) => {
                    tracing::info!(parent: &self.span, release = release.display_name(), %tag, "Deleted release");
                    report.releases_deleted.push(tag.to_string());
                }
                Ok(Deletion::NotFound) => {
                    tracing::info!(parent: &self.span, %tag, "Release already gone");
                }
                Err(e) => {
                    tracing::error!(parent: &self.span, %tag, error = %e, "Failed to delete release");
                    report.failures.push(FailedItem::new("release", tag, e));
                    // Keep the tag so the release can be retried
                    continue;
                }
            }

            if options.with_tags {
                self.delete_tag(tag, &mut report.tags_deleted, &mut report.failures)
                    .await;
            }
        }

        if options.clean_index {
            match self.wipe_index() {
                Ok(update) => report.index = Some(update),
                Err(e) => {
                    tracing::error!(
                        parent: &self.span,
                        branch = self.pages.branch(),
                        releases_deleted = report.releases_deleted.len(),
                        error = %e,
                        "Failed to clean index"
                    );
                    report
                        .failures
                        .push(FailedItem::new("index", self.pages.branch(), e));
                }
            }
        }

        Ok(report)
    }

    /// Delete the releases, tags and index entries of charts changed on the
    /// current branch
    ///
    /// Every changed chart must match the version policy. One that does not
    /// aborts the run before anything is deleted.
    pub async fn delete_changed(&self, detector: &ChangeDetector) -> Result<DeleteChangedReport> {
        self.api.verify_access().await?;

        let changes = detector.detect()?;
        let mut report = DeleteChangedReport {
            baseline: Some(changes.baseline),
            changed_files: changes.changed_files,
            ..Default::default()
        };

        let charts = changes.charts;
        if charts.is_empty() {
            tracing::info!(parent: &self.span, "No changed charts found");
            return Ok(report);
        }
        tracing::info!(parent: &self.span, count = charts.len(), "Found charts to delete");

        for chart in &charts {
            let tag = chart.release_name();
            match self.api.delete_release_by_tag(&tag).await {
                Ok(Deletion::Deleted) => {
                    tracing::info!(parent: &self.span, release = %tag, "Deleted release");
                    report.releases_deleted.push(tag.clone());
                }
                Ok(Deletion::NotFound) => {
                    tracing::info!(parent: &self.span, release = %tag, "No release found");
                    report.releases_missing.push(tag.clone());
                }
                Err(e) => {
                    tracing::error!(parent: &self.span, release = %tag, error = %e, "Failed to delete release");
                    report.failures.push(FailedItem::new("release", &tag, e));
                    // Keep the tag so the release can be retried
                    continue;
                }
            }

            self.delete_tag(&tag, &mut report.tags_deleted, &mut report.failures)
                .await;
        }

        let mut missing = Vec::new();
        let update = self.pages.update_index(|index| {
            let removal = index.remove_versions(&charts);
            missing = removal.missing.clone();
            Ok(removal.commit_message())
        })?;

        for chart in &missing {
            tracing::info!(
                parent: &self.span,
                chart = %chart.name,
                version = %chart.version,
                "Version not in index"
            );
        }

        report.index_missing = missing;
        report.index = Some(update);
        report.charts = charts;
        Ok(report)
    }

    /// Remove every entry from the index, leaving releases alone
    pub async fn clean_index(&self) -> Result<IndexUpdate> {
        self.api.verify_access().await?;
        self.wipe_index()
    }

    fn wipe_index(&self) -> Result<IndexUpdate> {
        self.pages.update_index(|index| {
            let removed = index.remove_all();
            tracing::info!(parent: &self.span, versions = removed, "Clearing index entries");
            Ok((removed > 0).then(|| CLEAR_INDEX_MESSAGE.to_string()))
        })
    }

    async fn delete_tag(&self, tag: &str, deleted: &mut Vec<String>, failures: &mut Vec<FailedItem>) {
        match self.api.delete_tag(tag).await {
            Ok(Deletion::Deleted) => {
                tracing::info!(parent: &self.span, %tag, "Deleted tag");
                deleted.push(tag.to_string());
            }
            Ok(Deletion::NotFound) => {
                tracing::info!(parent: &self.span, %tag, "Tag already gone");
            }
            Err(e) => {
                tracing::error!(parent: &self.span, %tag, error = %e, "Failed to delete tag");
                failures.push(FailedItem::new("tag", tag, e));
            }
        }
    }
}
