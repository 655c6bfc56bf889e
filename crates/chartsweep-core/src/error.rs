//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid version pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(
        "Chart {name} has version {version}, which does not match the pattern allowed for deletion: {pattern}"
    )]
    VersionNotDeletable {
        name: String,
        version: String,
        pattern: String,
    },

    #[error("Invalid Chart.yaml in {path}: {message}")]
    InvalidChart { path: String, message: String },

    #[error("Failed to parse Chart.yaml: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
