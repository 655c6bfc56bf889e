//! CLI error types with exit code handling
//!
//! Library errors are mapped onto a small set of user-facing categories,
//! each with its own exit code and, where it helps, a hint on what to do.

use chartsweep_core::CoreError;
use chartsweep_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Bad arguments
    #[error("{message}")]
    #[diagnostic(code(chartsweep::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// No token in the environment
    #[error("{message}")]
    #[diagnostic(
        code(chartsweep::cli::auth),
        help("Set GH_TOKEN or GITHUB_TOKEN, e.g. run `gh auth login` then `export GH_TOKEN=$(gh auth token)`")
    )]
    AuthRequired { message: String },

    /// Version policy refused the run
    #[error("{message}")]
    #[diagnostic(code(chartsweep::cli::policy))]
    Policy {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Git error: {message}")]
    #[diagnostic(code(chartsweep::cli::git))]
    Git {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("GitHub API error: {message}")]
    #[diagnostic(code(chartsweep::cli::api))]
    Api {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Index or local file error
    #[error("{message}")]
    #[diagnostic(code(chartsweep::cli::io))]
    Io { message: String },

    /// Some releases or tags were not deleted
    #[error("{failed} deletion(s) failed")]
    #[diagnostic(
        code(chartsweep::cli::partial),
        help("Re-run the command to retry the failed items")
    )]
    PartialFailure { failed: usize },

    #[error("{message}")]
    #[diagnostic(code(chartsweep::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::AuthRequired { .. } => exit_codes::AUTH_REQUIRED,
            CliError::Policy { .. } => exit_codes::POLICY_ERROR,
            CliError::Git { .. } => exit_codes::GIT_ERROR,
            CliError::Api { .. } => exit_codes::API_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::PartialFailure { .. } => exit_codes::PARTIAL_FAILURE,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::VersionNotDeletable { .. } => CliError::Policy {
                message: err.to_string(),
                help: Some(
                    "Only versions matching --version-pattern can be deleted; nothing was changed"
                        .to_string(),
                ),
            },
            CoreError::InvalidPattern { .. } => CliError::Policy {
                message: err.to_string(),
                help: Some("--version-pattern must be a valid regular expression".to_string()),
            },
            other => CliError::Io {
                message: other.to_string(),
            },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::InvalidRepository { .. } | RepoError::InvalidApiUrl { .. } => {
                CliError::Usage {
                    message,
                    help: None,
                }
            }
            RepoError::AuthRequired { .. } => CliError::AuthRequired { message },
            RepoError::AuthFailed { .. } => CliError::Api {
                message,
                help: Some(
                    "Check the token is valid and can write releases and contents of the repository"
                        .to_string(),
                ),
            },
            RepoError::HttpError { .. } | RepoError::NetworkError { .. } | RepoError::Timeout => {
                CliError::Api {
                    message,
                    help: None,
                }
            }
            RepoError::PagesBranchMissing { .. } => CliError::Git {
                message,
                help: Some("Publish the chart index first or pass --pages-branch".to_string()),
            },
            RepoError::NoBaseline { .. } => CliError::Git {
                message,
                help: Some("Make sure the base branch has been fetched (fetch-depth: 0 in CI)".to_string()),
            },
            RepoError::Git { .. } => CliError::Git {
                message,
                help: None,
            },
            RepoError::GitUnavailable(_) => CliError::Other { message },
            RepoError::Core(core) => core.into(),
            RepoError::IndexMissing { .. }
            | RepoError::IndexParseError { .. }
            | RepoError::Io(_)
            | RepoError::Serialization(_) => CliError::Io { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let cases: Vec<(CliError, i32)> = vec![
            (
                RepoError::InvalidRepository {
                    value: "acme".into(),
                }
                .into(),
                exit_codes::USAGE_ERROR,
            ),
            (
                RepoError::AuthRequired {
                    message: "no token".into(),
                }
                .into(),
                exit_codes::AUTH_REQUIRED,
            ),
            (
                RepoError::Core(CoreError::VersionNotDeletable {
                    name: "foo".into(),
                    version: "1.0.0".into(),
                    pattern: "^0\\.0\\.0-dev$".into(),
                })
                .into(),
                exit_codes::POLICY_ERROR,
            ),
            (RepoError::git("push", "rejected").into(), exit_codes::GIT_ERROR),
            (
                RepoError::HttpError {
                    status: 500,
                    message: "boom".into(),
                }
                .into(),
                exit_codes::API_ERROR,
            ),
            (
                RepoError::IndexMissing {
                    branch: "gh-pages".into(),
                    file: "index.yaml".into(),
                }
                .into(),
                exit_codes::IO_ERROR,
            ),
            (CliError::PartialFailure { failed: 2 }, exit_codes::PARTIAL_FAILURE),
        ];

        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err:?}");
        }
    }
}
