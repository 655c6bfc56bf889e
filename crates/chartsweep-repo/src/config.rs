//! Command configuration shared by all workflows

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{RepoError, Result};

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Branch that hosts the published chart index
pub const DEFAULT_PAGES_BRANCH: &str = "gh-pages";

/// Long-lived branch feature branches are diffed against
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Directory holding one sub-directory per chart
pub const DEFAULT_CHART_DIR: &str = "charts";

/// A GitHub repository in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Parse `owner/repo`
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || RepoError::InvalidRepository {
            value: value.to_string(),
        };

        let (owner, repo) = value.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }

        Ok(Self::from_parts(owner, repo))
    }

    /// Build from separate owner and repository names
    pub fn from_parts(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl FromStr for RepoSlug {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// GitHub API client settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// REST API base URL (GitHub Enterprise uses `https://host/api/v3`)
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Releases requested per page
    pub per_page: u32,
}

impl ApiConfig {
    /// Settings for a specific API endpoint
    pub fn with_base_url(url: &str) -> Result<Self> {
        let base_url = Url::parse(url).map_err(|e| RepoError::InvalidApiUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RepoError::InvalidApiUrl {
                url: url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
            per_page: 100,
        }
    }
}
