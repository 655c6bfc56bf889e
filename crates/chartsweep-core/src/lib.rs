//! chartsweep Core - chart types shared by the cleanup workflows
//!
//! This crate provides the pieces that do not talk to git or GitHub:
//! - `ChartInfo` / `ChartManifest`: a chart directory and its `Chart.yaml`
//! - `VersionPolicy`: the regex gate in front of every destructive action
//! - `ChartScanner`: turns a changed-file list into validated charts

pub mod chart;
pub mod error;
pub mod policy;
pub mod scanner;

pub use chart::{ChartInfo, ChartManifest, MANIFEST_FILE};
pub use error::{CoreError, Result};
pub use policy::{DEFAULT_VERSION_PATTERN, VersionPolicy};
pub use scanner::ChartScanner;
