//! Change grouping: changed files → chart directories → validated charts

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::Span;

use crate::chart::{ChartInfo, MANIFEST_FILE};
use crate::error::{CoreError, Result};
use crate::policy::VersionPolicy;

/// Groups a `git diff --name-only` listing by chart directory and validates
/// every touched chart against the version policy.
#[derive(Debug, Clone)]
pub struct ChartScanner {
    /// Repository root the changed paths are relative to
    root: PathBuf,
    /// Chart directory segments (`charts` → `["charts"]`)
    chart_dir: Vec<String>,
    policy: VersionPolicy,
    span: Span,
}

impl ChartScanner {
    pub fn new(root: impl Into<PathBuf>, chart_dir: &str, policy: VersionPolicy) -> Self {
        Self {
            root: root.into(),
            chart_dir: path_segments(chart_dir)
                .into_iter()
                .map(String::from)
                .collect(),
            policy,
            span: tracing::info_span!("scanner"),
        }
    }

    /// Attach the span scanner events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The configured chart directory, normalized (`./charts/` → `charts`)
    pub fn chart_dir(&self) -> String {
        self.chart_dir.join("/")
    }

    /// Candidate chart directories touched by the changed files
    ///
    /// A path belongs to chart `<chart-dir>/<name>` when it starts with the
    /// chart directory and lives inside `<name>`. Files directly under the
    /// chart directory belong to no chart.
    pub fn candidate_dirs<S: AsRef<str>>(&self, changed_files: &[S]) -> BTreeSet<String> {
        let prefix_len = self.chart_dir.len();

        changed_files
            .iter()
            .filter_map(|file| {
                let segments = path_segments(file.as_ref());
                if segments.len() < prefix_len + 2 {
                    return None;
                }
                let (prefix, rest) = segments.split_at(prefix_len);
                if prefix.iter().zip(&self.chart_dir).all(|(a, b)| *a == b.as_str()) {
                    let mut dir = self.chart_dir.clone();
                    dir.push(rest[0].to_string());
                    Some(dir.join("/"))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Resolve and validate every chart touched by the changed files
    ///
    /// Directories without a readable `Chart.yaml` are skipped with a warning.
    /// A chart whose version does not match the policy aborts the whole scan,
    /// so nothing is deleted on a misconfigured pattern.
    pub fn scan<S: AsRef<str>>(&self, changed_files: &[S]) -> Result<Vec<ChartInfo>> {
        let mut charts = Vec::new();

        for dir in self.candidate_dirs(changed_files) {
            if !self.root.join(&dir).join(MANIFEST_FILE).is_file() {
                tracing::warn!(parent: &self.span, chart_dir = %dir, "Not a Helm chart, skipping");
                continue;
            }

            let chart = match ChartInfo::load(&self.root, &dir) {
                Ok(chart) => chart,
                Err(e) => {
                    tracing::warn!(
                        parent: &self.span,
                        chart_dir = %dir,
                        error = %e,
                        "Could not read chart manifest, skipping"
                    );
                    continue;
                }
            };

            if !self.policy.matches(&chart.version) {
                return Err(CoreError::VersionNotDeletable {
                    name: chart.name,
                    version: chart.version,
                    pattern: self.policy.pattern().to_string(),
                });
            }

            tracing::info!(
                parent: &self.span,
                chart_dir = %dir,
                name = %chart.name,
                version = %chart.version,
                "Found Helm chart"
            );
            charts.push(chart);
        }

        Ok(charts)
    }
}

/// Split a repository-relative path into its meaningful segments
fn path_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DEFAULT_VERSION_PATTERN;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_chart(root: &Path, dir: &str, name: &str, version: &str) {
        let chart_dir = root.join(dir);
        std::fs::create_dir_all(&chart_dir).unwrap();
        std::fs::write(
            chart_dir.join(MANIFEST_FILE),
            format!("apiVersion: v2\nname: {name}\nversion: {version}\n"),
        )
        .unwrap();
    }

    fn scanner(root: &Path) -> ChartScanner {
        ChartScanner::new(root, "charts", VersionPolicy::default())
    }

    #[test]
    fn test_candidate_dirs_grouping() {
        let dir = TempDir::new().unwrap();
        let files = [
            "charts/a/Chart.yaml",
            "charts/a/values.yaml",
            "charts/b/README.md",
        ];

        let dirs = scanner(dir.path()).candidate_dirs(&files);
        let expected: BTreeSet<String> = ["charts/a", "charts/b"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dirs, expected);
    }

    #[test]
    fn test_candidate_dirs_ignores_other_paths() {
        let dir = TempDir::new().unwrap();
        let files = [
            "README.md",
            "charts",
            "charts/index.md",
            "docs/charts/a/Chart.yaml",
            "chartsx/a/Chart.yaml",
            "./charts/c/templates/deployment.yaml",
        ];

        let dirs = scanner(dir.path()).candidate_dirs(&files);
        assert_eq!(dirs.into_iter().collect::<Vec<_>>(), vec!["charts/c"]);
    }

    #[test]
    fn test_nested_chart_dir() {
        let dir = TempDir::new().unwrap();
        let scanner = ChartScanner::new(dir.path(), "./deploy/charts/", VersionPolicy::default());
        assert_eq!(scanner.chart_dir(), "deploy/charts");

        let dirs = scanner.candidate_dirs(&["deploy/charts/api/values.yaml", "deploy/other/x"]);
        assert_eq!(dirs.into_iter().collect::<Vec<_>>(), vec!["deploy/charts/api"]);
    }

    #[test]
    fn test_scan_returns_matching_charts() {
        let dir = TempDir::new().unwrap();
        write_chart(dir.path(), "charts/foo", "foo", "0.0.0-dev");
        write_chart(dir.path(), "charts/bar", "bar", "0.0.0-dev");

        let charts = scanner(dir.path())
            .scan(&["charts/foo/values.yaml", "charts/bar/Chart.yaml"])
            .unwrap();

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].name, "bar");
        assert_eq!(charts[1].name, "foo");
        assert!(charts.iter().all(|c| c.version == "0.0.0-dev"));
    }

    #[test]
    fn test_scan_skips_directories_without_manifest() {
        let dir = TempDir::new().unwrap();
        write_chart(dir.path(), "charts/foo", "foo", "0.0.0-dev");
        std::fs::create_dir_all(dir.path().join("charts/removed")).unwrap();

        let charts = scanner(dir.path())
            .scan(&["charts/foo/values.yaml", "charts/removed/Chart.yaml"])
            .unwrap();

        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].name, "foo");
    }

    #[test]
    fn test_scan_fails_closed_on_version_mismatch() {
        let dir = TempDir::new().unwrap();
        write_chart(dir.path(), "charts/foo", "foo", "0.0.0-dev");
        write_chart(dir.path(), "charts/prod", "prod", "1.0.0");

        let err = scanner(dir.path())
            .scan(&["charts/foo/values.yaml", "charts/prod/values.yaml"])
            .unwrap_err();

        match err {
            CoreError::VersionNotDeletable {
                name,
                version,
                pattern,
            } => {
                assert_eq!(name, "prod");
                assert_eq!(version, "1.0.0");
                assert_eq!(pattern, DEFAULT_VERSION_PATTERN);
            }
            other => panic!("Expected VersionNotDeletable, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_empty_input() {
        let dir = TempDir::new().unwrap();
        let files: [&str; 0] = [];
        assert!(scanner(dir.path()).scan(&files).unwrap().is_empty());
    }
}
