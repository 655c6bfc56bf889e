//! GitHub token resolution
//!
//! The token is read once from the environment when a command builds its
//! API client. `GH_TOKEN` wins over `GITHUB_TOKEN`, matching the `gh` CLI.

use std::fmt;

use crate::error::{RepoError, Result};

/// Environment variables checked for a token, in order
pub const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// A GitHub API token
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct GitHubToken(String);

impl GitHubToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the token from `GH_TOKEN` or `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve the token through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        TOKEN_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(Self)
            .ok_or_else(|| RepoError::AuthRequired {
                message: format!(
                    "no GitHub token found in {}. Run 'gh auth login' and export GH_TOKEN=$(gh auth token)",
                    TOKEN_VARS.join(" or ")
                ),
            })
    }

    /// Value for the `Authorization` header
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for GitHubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GitHubToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_gh_token_preferred() {
        let token =
            GitHubToken::from_lookup(lookup(&[("GH_TOKEN", "gh"), ("GITHUB_TOKEN", "actions")]))
                .unwrap();
        assert_eq!(token.auth_header(), "Bearer gh");
    }

    #[test]
    fn test_github_token_fallback() {
        let token = GitHubToken::from_lookup(lookup(&[("GH_TOKEN", "  "), ("GITHUB_TOKEN", "actions")]))
            .unwrap();
        assert_eq!(token.auth_header(), "Bearer actions");
    }

    #[test]
    fn test_missing_token() {
        let err = GitHubToken::from_lookup(lookup(&[])).unwrap_err();
        match err {
            RepoError::AuthRequired { message } => {
                assert!(message.contains("GH_TOKEN"));
                assert!(message.contains("gh auth login"));
            }
            other => panic!("Expected AuthRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let token = GitHubToken::new("ghp_secret");
        assert_eq!(format!("{token:?}"), "GitHubToken(***)");
    }
}
