//! Error types for git, GitHub and index operations

use chartsweep_core::CoreError;
use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid repository '{value}': expected owner/repo")]
    InvalidRepository { value: String },

    #[error("Invalid API URL: {url} - {reason}")]
    InvalidApiUrl { url: String, reason: String },

    // ============ Authentication Errors ============
    #[error("Authentication required: {message}")]
    AuthRequired { message: String },

    #[error("Authentication failed for {repository}: {message}")]
    AuthFailed { repository: String, message: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout")]
    Timeout,

    // ============ Git Errors ============
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("Failed to run git: {0}")]
    GitUnavailable(String),

    #[error("No baseline commit found to compare against {base_branch}")]
    NoBaseline { base_branch: String },

    // ============ Pages / Index Errors ============
    #[error("Pages branch '{branch}' does not exist on the remote")]
    PagesBranchMissing { branch: String },

    #[error("{file} not found on branch '{branch}'")]
    IndexMissing { branch: String, file: String },

    #[error("Index parse error: {message}")]
    IndexParseError { message: String },

    // ============ Chart Errors ============
    #[error(transparent)]
    Core(#[from] CoreError),

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    /// Shorthand for a failed git invocation
    pub fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        RepoError::Git {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(e: serde_json::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for RepoError {
    fn from(e: url::ParseError) -> Self {
        RepoError::InvalidApiUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}
