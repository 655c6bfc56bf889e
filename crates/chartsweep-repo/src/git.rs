//! Git command wrapper
//!
//! Every operation shells out to the `git` binary in the repository working
//! directory and waits for it to finish.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::Span;

use crate::error::{RepoError, Result};

/// Commit that changed files are diffed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Most recent tag reachable from the parent of HEAD
    Tag(String),
    /// First commit of the repository, used on the base branch itself
    RootCommit(String),
    /// Fork point of the current branch and the base branch
    MergeBase(String),
}

impl Baseline {
    /// Revision to pass to `git diff`
    pub fn revision(&self) -> &str {
        match self {
            Baseline::Tag(rev) | Baseline::RootCommit(rev) | Baseline::MergeBase(rev) => rev,
        }
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Baseline::Tag(tag) => write!(f, "tag {tag}"),
            Baseline::RootCommit(sha) => write!(f, "root commit {sha}"),
            Baseline::MergeBase(sha) => write!(f, "merge-base {sha}"),
        }
    }
}

/// Handle on a git working directory
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    remote: String,
    span: Span,
}

impl Git {
    /// Use `workdir` as is
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: "origin".to_string(),
            span: tracing::info_span!("git"),
        }
    }

    /// Locate the repository top-level containing `path`
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let probe = Self::new(path.as_ref());
        let toplevel = probe.run_checked(&["rev-parse", "--show-toplevel"])?;
        Ok(Self::new(toplevel))
    }

    /// Attach the span git events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Gets the current branch name
    pub fn current_branch(&self) -> Result<String> {
        self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Commit currently checked out
    pub fn head_commit(&self) -> Result<String> {
        self.run_checked(&["rev-parse", "HEAD"])
    }

    /// Fetch all tags from the remote
    pub fn fetch_tags(&self) -> Result<()> {
        self.run_checked(&["fetch", "--tags", &self.remote])
            .map(drop)
    }

    /// Pick the commit to diff against for the current branch
    ///
    /// Tags reachable from `HEAD~` win. Without one, the base branch compares
    /// against the root commit and any other branch against its merge-base
    /// with the base branch.
    pub fn resolve_baseline(&self, base_branch: &str) -> Result<Baseline> {
        if let Err(e) = self.fetch_tags() {
            tracing::warn!(parent: &self.span, error = %e, "Could not fetch tags");
        }

        let branch = self.current_branch()?;

        if let Some(tag) = self.previous_tag()? {
            tracing::debug!(parent: &self.span, %tag, "Using latest tag as baseline");
            return Ok(Baseline::Tag(tag));
        }

        let baseline = if branch == base_branch {
            self.root_commit()?.map(Baseline::RootCommit)
        } else {
            self.merge_base(base_branch)?.map(Baseline::MergeBase)
        };

        baseline.ok_or_else(|| RepoError::NoBaseline {
            base_branch: base_branch.to_string(),
        })
    }

    /// Latest tag reachable from the parent of HEAD
    fn previous_tag(&self) -> Result<Option<String>> {
        let output = self.run(&["describe", "--tags", "--abbrev=0", "HEAD~"])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(non_empty(stdout_of(&output)))
    }

    fn root_commit(&self) -> Result<Option<String>> {
        let roots = self.run_checked(&["rev-list", "--max-parents=0", "--first-parent", "HEAD"])?;
        Ok(roots.lines().next().map(str::to_string))
    }

    /// Merge-base with the local base branch, falling back to the
    /// remote-tracking one when it only exists there
    fn merge_base(&self, base_branch: &str) -> Result<Option<String>> {
        let remote_ref = format!("{}/{}", self.remote, base_branch);
        for candidate in [base_branch, remote_ref.as_str()] {
            let output = self.run(&["merge-base", "HEAD", candidate])?;
            if output.status.success() {
                if let Some(sha) = non_empty(stdout_of(&output)) {
                    return Ok(Some(sha));
                }
            }
        }
        Ok(None)
    }

    /// Files under `path` changed since `baseline`, relative to the top-level
    pub fn changed_files(&self, baseline: &Baseline, path: &str) -> Result<Vec<String>> {
        let listing = self.run_checked(&[
            "diff",
            "--find-renames",
            "--name-only",
            baseline.revision(),
            "--",
            path,
        ])?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Whether `branch` exists on the remote
    pub fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        let heads = self.run_checked(&["ls-remote", "--heads", &self.remote, branch])?;
        let wanted = format!("refs/heads/{branch}");
        Ok(heads
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(wanted.as_str())))
    }

    pub fn fetch_branch(&self, branch: &str) -> Result<()> {
        self.run_checked(&["fetch", &self.remote, branch]).map(drop)
    }

    /// Checks out a branch, creating a local tracking branch if needed
    pub fn checkout(&self, branch: &str) -> Result<()> {
        let output = self.run(&["checkout", branch])?;
        if output.status.success() {
            return Ok(());
        }

        let remote_ref = format!("{}/{}", self.remote, branch);
        let retry = self.run(&["checkout", "-b", branch, &remote_ref])?;
        if retry.status.success() {
            return Ok(());
        }

        Err(RepoError::git(
            format!("checkout {branch}"),
            format_git_error(&output),
        ))
    }

    pub fn pull_branch(&self, branch: &str) -> Result<()> {
        self.run_checked(&["pull", "--ff-only", &self.remote, branch])
            .map(drop)
    }

    /// Whether `file` differs from the last commit (or is untracked)
    pub fn has_changes(&self, file: &str) -> Result<bool> {
        let status = self.run_checked(&["status", "--porcelain", "--", file])?;
        Ok(!status.is_empty())
    }

    /// Throw away uncommitted changes to `file`, staged or not
    pub fn discard_changes(&self, file: &str) -> Result<()> {
        self.run_checked(&["checkout", "HEAD", "--", file]).map(drop)
    }

    /// Stage `file`, commit it and push `branch` to the remote
    pub fn commit_and_push(&self, file: &str, message: &str, branch: &str) -> Result<()> {
        self.run_checked(&["add", "--", file])?;
        self.run_checked(&["commit", "-m", message])?;
        self.run_checked(&["push", &self.remote, branch])?;
        tracing::info!(parent: &self.span, %branch, %file, "Committed and pushed");
        Ok(())
    }

    /// Run git and return its raw output
    pub fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(parent: &self.span, command = %args.join(" "), "git");

        let output = Command::new("git")
            .current_dir(&self.workdir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| RepoError::GitUnavailable(e.to_string()))?;

        tracing::trace!(
            parent: &self.span,
            status = ?output.status.code(),
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git output"
        );
        Ok(output)
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(stdout_of(&output))
        } else {
            Err(RepoError::git(args.join(" "), format_git_error(&output)))
        }
    }
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Best human-readable message from a failed git command
fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "exited with code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{stderr}\n{stdout}"),
    }
}
