//! Chart manifest loading

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Manifest file name inside a chart directory
pub const MANIFEST_FILE: &str = "Chart.yaml";

/// The subset of `Chart.yaml` this tool cares about
#[derive(Debug, Clone, Deserialize)]
pub struct ChartManifest {
    /// Chart name (falls back to the directory name when absent)
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,

    /// Chart version
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
}

impl ChartManifest {
    /// Parse a manifest from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read `Chart.yaml` from a chart directory
    pub fn load<P: AsRef<Path>>(chart_dir: P) -> Result<Self> {
        let content = std::fs::read_to_string(chart_dir.as_ref().join(MANIFEST_FILE))?;
        Self::from_yaml(&content)
    }
}

/// A chart directory together with its declared name and version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartInfo {
    /// Chart directory relative to the repository root (`charts/foo`)
    pub path: PathBuf,
    pub name: String,
    pub version: String,
}

impl ChartInfo {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Load chart information from `root/relative_dir/Chart.yaml`
    ///
    /// `relative_dir` is kept as the chart path so it matches the paths
    /// reported by `git diff`.
    pub fn load(root: &Path, relative_dir: &str) -> Result<Self> {
        let manifest = ChartManifest::load(root.join(relative_dir))?;

        let name = match manifest.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => relative_dir
                .rsplit('/')
                .next()
                .unwrap_or(relative_dir)
                .to_string(),
        };

        let version = manifest
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CoreError::InvalidChart {
                path: relative_dir.to_string(),
                message: "missing version".to_string(),
            })?;

        Ok(Self::new(relative_dir, name, version))
    }

    /// Release and tag name used by chart-releaser: `{name}-{version}`
    pub fn release_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl fmt::Display for ChartInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Accept unquoted YAML scalars (`version: 1.0`) as strings
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
