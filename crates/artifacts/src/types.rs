//! Store location and artifact addressing conventions.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::key::{build_key, slugify, Category, RunTimestamp};

/// Default public host for generated artifact URLs.
pub const DEFAULT_STORE_HOST: &str = "s3.amazonaws.com";

/// Bucket and project scoping for one artifact repository.
///
/// All keys produced through a location share the
/// `{bucket}/{project}/...` prefix. The project slug is fixed at
/// construction; the bucket name is embedded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreLocation {
    /// Bucket name.
    pub bucket: String,
    /// Project slug (already slugified).
    pub project: String,
    /// Host used for generated artifact URLs.
    pub host: String,
}

impl StoreLocation {
    /// Create a location for a project.
    ///
    /// # Errors
    /// Returns `InvalidSegment` if the project name or bucket is empty
    /// after slugification.
    pub fn new(bucket: impl Into<String>, project: &str) -> Result<Self, StoreError> {
        let bucket: String = bucket.into();
        if bucket.is_empty() {
            return Err(StoreError::InvalidSegment { segment: bucket });
        }

        let project_slug: String = slugify(project);
        if project_slug.is_empty() {
            return Err(StoreError::InvalidSegment {
                segment: project.to_string(),
            });
        }

        Ok(Self {
            bucket,
            project: project_slug,
            host: DEFAULT_STORE_HOST.to_string(),
        })
    }

    /// Override the host used for artifact URLs.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// The `{bucket}/{project}` prefix every key starts with.
    pub fn project_prefix(&self) -> String {
        format!("{}/{}", self.bucket, self.project)
    }

    /// Prefix for one artifact category: `{bucket}/{project}/{category}`.
    pub fn category_prefix(&self, category: &Category) -> String {
        format!("{}/{}", self.project_prefix(), slugify(category.as_str()))
    }

    /// Prefix for run results of one domain/environment pair:
    /// `{bucket}/{project}/results/{domain}/{environment}`.
    pub fn results_prefix(&self, domain: &str, environment: &str) -> String {
        format!(
            "{}/{}/{}",
            self.category_prefix(&Category::Results),
            slugify(domain),
            slugify(environment)
        )
    }

    /// Key for a page screenshot:
    /// `{prefix}/snaps/{url}/{timestamp}/{page}.png`.
    pub fn snap_key(
        &self,
        url: &str,
        page_path: &str,
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        build_key(
            &self.bucket,
            &self.project,
            &Category::Snaps,
            &[url],
            timestamp,
            &format!("{}.png", slugify(page_path)),
        )
    }

    /// Key for a visual-diff image:
    /// `{prefix}/diffs/{from}_vs_{to}/{timestamp}/{page}.png`.
    pub fn diff_key(
        &self,
        from: &str,
        to: &str,
        page_path: &str,
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        build_key(
            &self.bucket,
            &self.project,
            &Category::Diffs,
            &[&format!("{}_vs_{}", slugify(from), slugify(to))],
            timestamp,
            &format!("{}.png", slugify(page_path)),
        )
    }

    /// Key for diff result JSON, stored as `conflicts.json` next to the
    /// diff images for the same comparison.
    pub fn diff_results_key(
        &self,
        from: &str,
        to: &str,
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        build_key(
            &self.bucket,
            &self.project,
            &Category::Diffs,
            &[&format!("{}_vs_{}", slugify(from), slugify(to))],
            timestamp,
            "conflicts.json",
        )
    }

    /// Key for a crawl snapshot: `{prefix}/crawls/{domain}/{timestamp}.json`.
    /// The timestamp token doubles as the filename stem.
    pub fn crawl_key(&self, domain: &str, timestamp: &RunTimestamp) -> Result<String, StoreError> {
        let domain_slug: String = slugify(domain);
        if domain_slug.is_empty() {
            return Err(StoreError::InvalidSegment {
                segment: domain.to_string(),
            });
        }
        Ok(format!(
            "{}/{}/{}.json",
            self.category_prefix(&Category::Crawls),
            domain_slug,
            timestamp.token()
        ))
    }

    /// Public URL for an artifact key, for the notification collaborator.
    /// Not interpreted further by this layer.
    pub fn artifact_url(&self, key: &str) -> String {
        format!("https://{}/{}/{}", self.host, self.bucket, key)
    }
}
