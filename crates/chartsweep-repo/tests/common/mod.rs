//! Git repository fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub const INDEX_YAML: &str = r#"apiVersion: v1
entries:
  bar:
  - name: bar
    urls:
    - https://github.com/acme/charts/releases/download/bar-0.0.0-dev/bar-0.0.0-dev.tgz
    version: 0.0.0-dev
  foo:
  - digest: 4f2a
    name: foo
    urls:
    - https://github.com/acme/charts/releases/download/foo-0.0.0-dev/foo-0.0.0-dev.tgz
    version: 0.0.0-dev
  - name: foo
    urls:
    - https://github.com/acme/charts/releases/download/foo-1.0.0/foo-1.0.0.tgz
    version: 1.0.0
generated: "2024-01-01T00:00:00Z"
"#;

/// A working copy with a local bare `origin`
///
/// `main` holds chart `foo`, `gh-pages` holds [`INDEX_YAML`], and the
/// checked out `feature` branch changes `charts/foo/values.yaml`.
pub struct GitFixture {
    _dir: TempDir,
    pub origin: PathBuf,
    pub work: PathBuf,
}

impl GitFixture {
    pub fn new() -> Self {
        Self::with_chart_version("0.0.0-dev")
    }

    pub fn with_chart_version(version: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let origin = dir.path().join("origin.git");
        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();

        run(dir.path(), &["init", "--quiet", "--bare", "origin.git"]);
        run(&origin, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let fixture = Self {
            _dir: dir,
            origin,
            work,
        };

        fixture.git(&["init", "--quiet"]);
        fixture.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        fixture.git(&["config", "user.email", "test@test.com"]);
        fixture.git(&["config", "user.name", "Test"]);
        fixture.git(&["config", "commit.gpgsign", "false"]);
        let origin_url = fixture.origin.to_string_lossy().to_string();
        fixture.git(&["remote", "add", "origin", &origin_url]);

        fixture.write(
            "charts/foo/Chart.yaml",
            &format!("apiVersion: v2\nname: foo\nversion: {version}\n"),
        );
        fixture.write("charts/foo/values.yaml", "replicas: 1\n");
        fixture.write("README.md", "# charts\n");
        fixture.commit_all("Add foo chart");
        fixture.git(&["push", "--quiet", "origin", "main"]);

        fixture.push_orphan_branch("gh-pages", &[("index.yaml", INDEX_YAML)]);

        fixture.git(&["checkout", "--quiet", "-b", "feature"]);
        fixture.write("charts/foo/values.yaml", "replicas: 2\n");
        fixture.commit_all("Bump replicas");

        fixture
    }

    /// Publish a branch with unrelated history holding only `files`
    pub fn push_orphan_branch(&self, branch: &str, files: &[(&str, &str)]) {
        let current = self.current_branch();
        self.git(&["checkout", "--quiet", "--orphan", branch]);
        self.git(&["rm", "-rf", "--quiet", "."]);
        for (path, content) in files {
            self.write(path, content);
        }
        self.commit_all(&format!("Initialize {branch}"));
        self.git(&["push", "--quiet", "origin", branch]);
        self.git(&["checkout", "--quiet", &current]);
    }

    /// Run git in the working copy, returning trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        run(&self.work, args)
    }

    /// Run git against the bare origin
    pub fn origin_git(&self, args: &[&str]) -> String {
        run(&self.origin, args)
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.work.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    /// Install an executable git hook in the working copy
    #[cfg(unix)]
    pub fn install_hook(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.work.join(".git").join("hooks").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message]);
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// `index.yaml` as pushed to origin's pages branch
    pub fn remote_index(&self) -> String {
        self.origin_git(&["show", "gh-pages:index.yaml"])
    }

    /// Full message of the latest commit on an origin branch
    pub fn remote_message(&self, branch: &str) -> String {
        self.origin_git(&["log", "-1", "--format=%B", branch])
    }

    pub fn remote_commit(&self, branch: &str) -> String {
        self.origin_git(&["rev-parse", branch])
    }
}

fn run(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
