//! GitHub releases API client

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::Span;
use url::Url;

use crate::config::{ApiConfig, RepoSlug};
use crate::credentials::GitHubToken;
use crate::error::{RepoError, Result};

const API_VERSION: &str = "2022-11-28";

/// A GitHub release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    /// Release title, may be unset
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
}

impl Release {
    /// Title shown to users, falling back to the tag
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

/// Outcome of a delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// The object did not exist, which counts as already deleted
    NotFound,
}

/// Release and tag operations on one repository
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Check the token can read the repository
    async fn verify_access(&self) -> Result<()>;

    /// All releases, across every page
    async fn list_releases(&self) -> Result<Vec<Release>>;

    /// Release attached to `tag`, if any
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>>;

    async fn delete_release(&self, id: u64) -> Result<Deletion>;

    /// Delete the tag ref `refs/tags/{tag}`
    async fn delete_tag(&self, tag: &str) -> Result<Deletion>;

    /// Look up the release attached to `tag` and delete it
    async fn delete_release_by_tag(&self, tag: &str) -> Result<Deletion> {
        match self.get_release_by_tag(tag).await? {
            Some(release) => self.delete_release(release.id).await,
            None => Ok(Deletion::NotFound),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// REST client for one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: ApiConfig,
    repo: RepoSlug,
    token: GitHubToken,
    span: Span,
}

impl GitHubClient {
    pub fn new(config: ApiConfig, repo: RepoSlug, token: GitHubToken) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(concat!("chartsweep/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            config,
            repo,
            token,
            span: tracing::info_span!("github"),
        })
    }

    /// Attach the span API events are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// `{base}/repos/{owner}/{repo}/{route...}`
    fn repo_url(&self, route: &[&str]) -> Result<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepoError::InvalidApiUrl {
                url: self.config.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str()])
            .extend(route);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(parent: &self.span, %method, %url, "GitHub request");
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.token.auth_header())
    }

    /// Turn a non-success response into `HttpError` carrying GitHub's message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = Self::error_message(response).await;
        Err(RepoError::HttpError {
            status: status.as_u16(),
            message,
        })
    }

    async fn error_message(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            })
    }

    /// DELETE with 404 mapped to `NotFound`
    async fn delete(&self, url: Url) -> Result<Deletion> {
        let response = self.request(Method::DELETE, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Deletion::NotFound);
        }
        Self::check(response).await?;
        Ok(Deletion::Deleted)
    }
}

#[async_trait]
impl ReleaseApi for GitHubClient {
    async fn verify_access(&self) -> Result<()> {
        let response = self.request(Method::GET, self.repo_url(&[])?).send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                let status = response.status();
                let message = Self::error_message(response).await;
                Err(RepoError::AuthFailed {
                    repository: self.repo.to_string(),
                    message: format!("{} ({})", message, status.as_u16()),
                })
            }
            _ => {
                Self::check(response).await?;
                tracing::debug!(parent: &self.span, repository = %self.repo, "Repository access verified");
                Ok(())
            }
        }
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let mut url = self.repo_url(&["releases"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.config.per_page.to_string());

        let mut releases = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            let response = Self::check(self.request(Method::GET, page_url).send().await?).await?;

            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link)
                .map(|link| Url::parse(&link))
                .transpose()?;

            let page: Vec<Release> = response.json().await?;
            releases.extend(page);
        }

        tracing::info!(parent: &self.span, count = releases.len(), "Listed releases");
        Ok(releases)
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let url = self.repo_url(&["releases", "tags", tag])?;
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release = Self::check(response).await?.json().await?;
        Ok(Some(release))
    }

    async fn delete_release(&self, id: u64) -> Result<Deletion> {
        let id = id.to_string();
        self.delete(self.repo_url(&["releases", &id])?).await
    }

    async fn delete_tag(&self, tag: &str) -> Result<Deletion> {
        let url = self.repo_url(&["git", "refs", "tags", tag])?;
        match self.delete(url).await {
            // GitHub answers 422 for a ref that is already gone
            Err(RepoError::HttpError { status: 422, message })
                if message.contains("Reference does not exist") =>
            {
                Ok(Deletion::NotFound)
            }
            other => other,
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';').map(str::trim);
        let target = pieces.next()?.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = pieces.any(|param| {
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });
        is_next.then(|| target.to_string())
    })
}
