//! Chart repository index (`index.yaml`)
//!
//! Helm-compatible index document. Only the fields this tool edits are typed;
//! everything else on the document and on each entry is kept verbatim so a
//! rewrite never loses digests, timestamps or server metadata.

use std::path::{Path, PathBuf};

use chartsweep_core::ChartInfo;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RepoError, Result};

/// Index file name at the root of the pages branch
pub const INDEX_FILE: &str = "index.yaml";

/// Fields not modelled explicitly, in document order
pub type ExtraFields = IndexMap<String, serde_yaml::Value>;

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Charts indexed by name
    #[serde(default, deserialize_with = "nullable_entries")]
    pub entries: IndexMap<String, Vec<ChartVersionEntry>>,

    /// When this index was last written
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

fn default_api_version() -> String {
    "v1".to_string()
}

/// `entries:` with no value parses as null; treat it as empty
fn nullable_entries<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, Vec<ChartVersionEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for IndexDocument {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            entries: IndexMap::new(),
            generated: Utc::now(),
            extra: ExtraFields::new(),
        }
    }
}

/// Outcome of removing specific chart versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Versions that were present and have been removed
    pub removed: Vec<ChartInfo>,
    /// Versions that were not in the index
    pub missing: Vec<ChartInfo>,
}

impl RemovalReport {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Commit message describing the removed versions
    pub fn commit_message(&self) -> Option<String> {
        match self.removed.as_slice() {
            [] => None,
            [chart] => Some(format!(
                "Remove {} v{} from index",
                chart.name, chart.version
            )),
            charts => {
                let mut message = format!("Remove {} chart versions from index\n", charts.len());
                for chart in charts {
                    message.push_str(&format!("\n- {} v{}", chart.name, chart.version));
                }
                Some(message)
            }
        }
    }
}

/// Commit message used when every entry is dropped
pub const CLEAR_INDEX_MESSAGE: &str = "Clear all chart entries from index";

impl IndexDocument {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Serialize the index back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Get a specific version of a chart
    pub fn get_version(&self, name: &str, version: &str) -> Option<&ChartVersionEntry> {
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.version == version)
    }

    /// Total number of chart versions in the index
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Drop every entry, returning how many versions were removed
    pub fn remove_all(&mut self) -> usize {
        let removed = self.version_count();
        if !self.entries.is_empty() {
            self.entries.clear();
            self.touch();
        }
        removed
    }

    /// Remove one chart version; a chart left with no versions is removed
    /// from the map entirely
    pub fn remove_version(&mut self, name: &str, version: &str) -> bool {
        let Some(versions) = self.entries.get_mut(name) else {
            return false;
        };

        let before = versions.len();
        versions.retain(|e| e.version != version);
        if versions.len() == before {
            return false;
        }

        if versions.is_empty() {
            self.entries.shift_remove(name);
        }
        self.touch();
        true
    }

    /// Remove the given chart versions
    ///
    /// Charts or versions absent from the index are reported as missing.
    /// Running it twice with the same input leaves the document unchanged.
    pub fn remove_versions(&mut self, charts: &[ChartInfo]) -> RemovalReport {
        let mut report = RemovalReport::default();
        for chart in charts {
            if self.remove_version(&chart.name, &chart.version) {
                report.removed.push(chart.clone());
            } else {
                report.missing.push(chart.clone());
            }
        }
        report
    }

    fn touch(&mut self) {
        self.generated = Utc::now();
    }
}

/// One chart version in the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartVersionEntry {
    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version
    pub version: String,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// `digest`, `created`, `appVersion` and anything else Helm writes
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ChartVersionEntry {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }
}

/// `index.yaml` on disk
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Index file inside a checkout directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(INDEX_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<IndexDocument> {
        let content = std::fs::read_to_string(&self.path)?;
        IndexDocument::from_yaml(&content)
    }

    pub fn save(&self, index: &IndexDocument) -> Result<()> {
        std::fs::write(&self.path, index.to_yaml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> IndexDocument {
        let yaml = r#"
apiVersion: v1
entries:
  foo:
    - apiVersion: v2
      appVersion: "1.25.0"
      created: "2024-01-01T00:00:00Z"
      digest: abc123
      name: foo
      urls:
        - https://example.com/releases/download/foo-0.0.0-dev/foo-0.0.0-dev.tgz
      version: 0.0.0-dev
    - name: foo
      urls:
        - https://example.com/releases/download/foo-1.0.0/foo-1.0.0.tgz
      version: 1.0.0
  bar:
    - name: bar
      urls:
        - https://example.com/releases/download/bar-0.0.0-dev/bar-0.0.0-dev.tgz
      version: 0.0.0-dev
generated: "2024-01-01T00:00:00Z"
serverInfo:
  contextPath: /charts
"#;
        IndexDocument::from_yaml(yaml).unwrap()
    }

    fn chart(name: &str, version: &str) -> ChartInfo {
        ChartInfo::new(format!("charts/{name}"), name, version)
    }

    #[test]
    fn test_parse_index() {
        let index = sample_index();
        assert_eq!(index.api_version, "v1");
        assert_eq!(index.entries.len(), 2);
        assert_eq!(index.version_count(), 3);
        assert!(index.extra.contains_key("serverInfo"));

        let entry = index.get_version("foo", "0.0.0-dev").unwrap();
        assert_eq!(entry.urls.len(), 1);
        assert_eq!(
            entry.extra.get("digest"),
            Some(&serde_yaml::Value::String("abc123".to_string()))
        );
    }

    #[test]
    fn test_parse_null_entries() {
        let index = IndexDocument::from_yaml("apiVersion: v1\nentries:\n").unwrap();
        assert!(index.entries.is_empty());
    }

    #[test]
    fn test_parse_invalid() {
        let err = IndexDocument::from_yaml("entries: [not, a, map]").unwrap_err();
        assert!(matches!(err, RepoError::IndexParseError { .. }));
    }

    #[test]
    fn test_remove_versions_preserves_unrelated() {
        let mut index = sample_index();
        let bar_before = index.entries["bar"].clone();

        let report = index.remove_versions(&[chart("foo", "0.0.0-dev")]);

        assert_eq!(report.removed, vec![chart("foo", "0.0.0-dev")]);
        assert!(report.missing.is_empty());
        assert!(index.get_version("foo", "0.0.0-dev").is_none());
        assert!(index.get_version("foo", "1.0.0").is_some());
        assert_eq!(index.entries["bar"], bar_before);
    }

    #[test]
    fn test_remove_versions_drops_empty_key() {
        let mut index = sample_index();
        index.remove_versions(&[chart("bar", "0.0.0-dev")]);

        assert!(!index.entries.contains_key("bar"));
        let yaml = index.to_yaml().unwrap();
        assert!(!yaml.contains("bar:"));
    }

    #[test]
    fn test_remove_versions_idempotent() {
        let mut index = sample_index();
        let charts = [chart("foo", "0.0.0-dev"), chart("bar", "0.0.0-dev")];

        let first = index.remove_versions(&charts);
        assert_eq!(first.removed.len(), 2);
        let after_first = index.clone();

        let second = index.remove_versions(&charts);
        assert!(!second.changed());
        assert_eq!(second.missing.len(), 2);
        assert_eq!(index, after_first);
    }

    #[test]
    fn test_remove_missing_leaves_document_untouched() {
        let mut index = sample_index();
        let before = index.clone();

        let report = index.remove_versions(&[chart("foo", "9.9.9"), chart("absent", "0.0.0-dev")]);

        assert!(!report.changed());
        assert_eq!(index, before);
    }

    #[test]
    fn test_commit_message() {
        let mut index = sample_index();
        let single = index.remove_versions(&[chart("foo", "0.0.0-dev")]);
        assert_eq!(
            single.commit_message().as_deref(),
            Some("Remove foo v0.0.0-dev from index")
        );

        let mut index = sample_index();
        let several = index.remove_versions(&[chart("foo", "1.0.0"), chart("bar", "0.0.0-dev")]);
        let message = several.commit_message().unwrap();
        assert!(message.starts_with("Remove 2 chart versions from index\n"));
        assert!(message.contains("- foo v1.0.0"));
        assert!(message.contains("- bar v0.0.0-dev"));

        assert!(RemovalReport::default().commit_message().is_none());
    }

    #[test]
    fn test_remove_all() {
        let mut index = sample_index();
        assert_eq!(index.remove_all(), 3);
        assert!(index.entries.is_empty());
        assert_eq!(index.remove_all(), 0);
    }

    #[test]
    fn test_store_round_trip_keeps_extra_fields() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::in_dir(dir.path());
        assert!(!store.exists());

        let mut index = sample_index();
        index.remove_versions(&[chart("bar", "0.0.0-dev")]);
        store.save(&index).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, index);
        assert!(loaded.extra.contains_key("serverInfo"));
        let entry = loaded.get_version("foo", "0.0.0-dev").unwrap();
        assert!(entry.extra.contains_key("appVersion"));
        assert!(entry.extra.contains_key("created"));

        // Entry order survives the rewrite
        let versions: Vec<_> = loaded.entries["foo"].iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["0.0.0-dev", "1.0.0"]);
    }
}
