//! In-memory release API for testing
//!
//! Holds releases and tags in memory and records every call, so workflows
//! can be exercised without a GitHub repository.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{RepoError, Result};
use crate::github::{Deletion, Release, ReleaseApi};

/// In-memory release API
#[derive(Clone, Default)]
pub struct MockReleaseApi {
    releases: Arc<RwLock<Vec<Release>>>,
    tags: Arc<RwLock<BTreeSet<String>>>,
    /// Tags whose release or ref deletion fails
    failing: Arc<RwLock<HashSet<String>>>,
    deny_access: Arc<RwLock<bool>>,
    deleted_releases: Arc<RwLock<Vec<String>>>,
    deleted_tags: Arc<RwLock<Vec<String>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of calls made, for test assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub access_checks: usize,
    pub lists: usize,
    pub gets: usize,
    pub release_deletes: usize,
    pub tag_deletes: usize,
}

impl MockReleaseApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with releases whose tags also exist
    pub fn with_releases(releases: Vec<Release>) -> Self {
        let api = Self::new();
        {
            let mut tags = api.tags.write().unwrap();
            tags.extend(releases.iter().map(|r| r.tag_name.clone()));
        }
        *api.releases.write().unwrap() = releases;
        api
    }

    /// Shorthand for a release titled after its tag
    pub fn release(id: u64, tag: &str) -> Release {
        Release {
            id,
            name: Some(tag.to_string()),
            tag_name: tag.to_string(),
        }
    }

    /// Make deletions touching `tag` fail with a server error
    pub fn fail_on(self, tag: &str) -> Self {
        self.failing.write().unwrap().insert(tag.to_string());
        self
    }

    /// Make the access check fail
    pub fn deny_access(self) -> Self {
        *self.deny_access.write().unwrap() = true;
        self
    }

    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Releases still present
    pub fn releases(&self) -> Vec<Release> {
        self.releases.read().unwrap().clone()
    }

    /// Tags still present
    pub fn tags(&self) -> Vec<String> {
        self.tags.read().unwrap().iter().cloned().collect()
    }

    /// Tags of deleted releases, in call order
    pub fn deleted_releases(&self) -> Vec<String> {
        self.deleted_releases.read().unwrap().clone()
    }

    /// Deleted tag refs, in call order
    pub fn deleted_tags(&self) -> Vec<String> {
        self.deleted_tags.read().unwrap().clone()
    }

    fn check_failure(&self, tag: &str) -> Result<()> {
        if self.failing.read().unwrap().contains(tag) {
            return Err(RepoError::HttpError {
                status: 500,
                message: format!("simulated failure for {tag}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReleaseApi for MockReleaseApi {
    async fn verify_access(&self) -> Result<()> {
        self.operations.write().unwrap().access_checks += 1;
        if *self.deny_access.read().unwrap() {
            return Err(RepoError::AuthFailed {
                repository: "mock/mock".to_string(),
                message: "Bad credentials (401)".to_string(),
            });
        }
        Ok(())
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.operations.write().unwrap().lists += 1;
        Ok(self.releases())
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        self.operations.write().unwrap().gets += 1;
        let releases = self.releases.read().unwrap();
        Ok(releases.iter().find(|r| r.tag_name == tag).cloned())
    }

    async fn delete_release(&self, id: u64) -> Result<Deletion> {
        self.operations.write().unwrap().release_deletes += 1;

        let mut releases = self.releases.write().unwrap();
        let Some(pos) = releases.iter().position(|r| r.id == id) else {
            return Ok(Deletion::NotFound);
        };
        self.check_failure(&releases[pos].tag_name)?;

        let release = releases.remove(pos);
        self.deleted_releases.write().unwrap().push(release.tag_name);
        Ok(Deletion::Deleted)
    }

    async fn delete_tag(&self, tag: &str) -> Result<Deletion> {
        self.operations.write().unwrap().tag_deletes += 1;
        self.check_failure(tag)?;

        if self.tags.write().unwrap().remove(tag) {
            self.deleted_tags.write().unwrap().push(tag.to_string());
            Ok(Deletion::Deleted)
        } else {
            Ok(Deletion::NotFound)
        }
    }
}
