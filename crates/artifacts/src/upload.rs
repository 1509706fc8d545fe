//! Upload orchestration for run artifacts.
//!
//! `upload_tree` walks a local directory, maps each regular file onto a
//! destination key, infers its content type, and uploads concurrently.
//! Failures are collected per file and reported together once every
//! transfer has settled (fail-at-end): one broken file never cancels its
//! siblings, but the batch as a whole still fails if any file did.

use std::path::{Component, Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, UploadFailure};
use crate::key::RunTimestamp;
use crate::traits::ObjectStore;
use crate::types::StoreLocation;

/// Default concurrency for parallel uploads.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;

/// OS metadata files skipped during directory walks.
pub const OS_METADATA_FILES: &[&str] = &[".DS_Store"];

/// Fallback content type for unrecognized extensions.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Infer a content type from a file extension.
///
/// Fixed table covering the artifact types a run produces; anything else
/// is an opaque binary.
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return BINARY_CONTENT_TYPE;
    };
    match extension.to_ascii_lowercase().as_str() {
        "html" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => BINARY_CONTENT_TYPE,
    }
}

/// Options for upload operations.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Maximum concurrent uploads.
    pub max_concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

/// Local-path to remote-key pairing for one discovered file.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Local file to read.
    pub local_path: PathBuf,
    /// Destination key.
    pub key: String,
    /// Inferred content type.
    pub content_type: &'static str,
}

/// High-level upload operations using any `ObjectStore` implementation.
pub struct UploadOrchestrator<'a, C: ObjectStore> {
    /// The store to write to.
    store: &'a C,
    /// Bucket/project scoping.
    location: StoreLocation,
    /// Upload options.
    options: UploadOptions,
}

impl<'a, C: ObjectStore> UploadOrchestrator<'a, C> {
    /// Create a new upload orchestrator.
    pub fn new(store: &'a C, location: StoreLocation) -> Self {
        Self {
            store,
            location,
            options: UploadOptions::default(),
        }
    }

    /// Set upload options.
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// The location this orchestrator writes under.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Upload every regular file under `local_root` to
    /// `{dest_prefix}/{path relative to local_root}`.
    ///
    /// Directories and OS metadata files are skipped. All uploads run
    /// concurrently; the call resolves only once every transfer has
    /// settled.
    ///
    /// # Returns
    /// The uploaded keys, in no particular order.
    ///
    /// # Errors
    /// `PartialUpload` carrying both the uploaded keys and the per-file
    /// failures when one or more transfers failed.
    pub async fn upload_tree(
        &self,
        local_root: &Path,
        dest_prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let tasks: Vec<UploadTask> = collect_upload_tasks(local_root, dest_prefix)?;

        let max_concurrency: usize = self.options.max_concurrency.max(1);
        let results: Vec<Result<String, UploadFailure>> = stream::iter(tasks)
            .map(|task: UploadTask| async move {
                match self.upload_task(&task).await {
                    Ok(()) => Ok(task.key),
                    Err(error) => Err(UploadFailure::new(
                        task.local_path.display().to_string(),
                        error,
                    )),
                }
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        let mut uploaded: Vec<String> = Vec::new();
        let mut failures: Vec<UploadFailure> = Vec::new();
        for result in results {
            match result {
                Ok(key) => uploaded.push(key),
                Err(failure) => failures.push(failure),
            }
        }

        if failures.is_empty() {
            debug!(
                prefix = dest_prefix,
                files = uploaded.len(),
                "upload batch complete"
            );
            Ok(uploaded)
        } else {
            warn!(
                prefix = dest_prefix,
                uploaded = uploaded.len(),
                failed = failures.len(),
                "upload batch finished with failures"
            );
            Err(StoreError::PartialUpload { uploaded, failures })
        }
    }

    /// Upload a results tree for one domain/environment/run:
    /// `{bucket}/{project}/results/{domain}/{environment}/{timestamp}/...`.
    pub async fn upload_results_tree(
        &self,
        domain: &str,
        environment: &str,
        timestamp: &RunTimestamp,
        local_root: &Path,
    ) -> Result<Vec<String>, StoreError> {
        let dest_prefix: String = format!(
            "{}/{}",
            self.location.results_prefix(domain, environment),
            timestamp.token()
        );
        self.upload_tree(local_root, &dest_prefix).await
    }

    /// Write a single object. Fatal on transport failure; no retry.
    pub async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        debug!(key, content_type, bytes = body.len(), "uploading object");
        self.store
            .put_object(&self.location.bucket, key, body, Some(content_type))
            .await
    }

    /// Upload a page screenshot under `snaps/`.
    pub async fn upload_snap(
        &self,
        url: &str,
        page_path: &str,
        png: &[u8],
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        let key: String = self.location.snap_key(url, page_path, timestamp)?;
        self.put_object(&key, png, "image/png").await?;
        Ok(key)
    }

    /// Upload a visual-diff image under `diffs/{from}_vs_{to}/`.
    pub async fn upload_diff(
        &self,
        from: &str,
        to: &str,
        page_path: &str,
        png: &[u8],
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        let key: String = self.location.diff_key(from, to, page_path, timestamp)?;
        self.put_object(&key, png, "image/png").await?;
        Ok(key)
    }

    /// Upload diff result JSON as `conflicts.json` for a comparison.
    pub async fn upload_diff_results<T: Serialize>(
        &self,
        from: &str,
        to: &str,
        data: &T,
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        let key: String = self.location.diff_results_key(from, to, timestamp)?;
        let body: Vec<u8> = serialize_json(&key, data)?;
        self.put_object(&key, &body, "application/json").await?;
        Ok(key)
    }

    /// Upload a crawl snapshot as `crawls/{domain}/{timestamp}.json`.
    pub async fn upload_crawl_data<T: Serialize>(
        &self,
        domain: &str,
        data: &T,
        timestamp: &RunTimestamp,
    ) -> Result<String, StoreError> {
        let key: String = self.location.crawl_key(domain, timestamp)?;
        let body: Vec<u8> = serialize_json(&key, data)?;
        self.put_object(&key, &body, "application/json").await?;
        Ok(key)
    }

    /// Read one file and write it to its destination key.
    async fn upload_task(&self, task: &UploadTask) -> Result<(), StoreError> {
        let body: Vec<u8> = tokio::fs::read(&task.local_path)
            .await
            .map_err(|e: std::io::Error| StoreError::io(task.local_path.display().to_string(), e))?;
        self.put_object(&task.key, &body, task.content_type).await
    }
}

fn serialize_json<T: Serialize>(key: &str, data: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(data).map_err(|e: serde_json::Error| StoreError::Io {
        path: key.to_string(),
        message: format!("serializing JSON body: {}", e),
    })
}

/// Walk `local_root` and build one task per regular file.
///
/// Keys use POSIX separators regardless of the local platform.
pub fn collect_upload_tasks(
    local_root: &Path,
    dest_prefix: &str,
) -> Result<Vec<UploadTask>, StoreError> {
    let prefix: &str = dest_prefix.trim_end_matches('/');
    let mut tasks: Vec<UploadTask> = Vec::new();

    for entry in WalkDir::new(local_root) {
        let entry = entry.map_err(|e: walkdir::Error| {
            StoreError::io(local_root.display().to_string(), e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if OS_METADATA_FILES.contains(&name.as_ref()) {
            continue;
        }

        let relative: &Path = entry
            .path()
            .strip_prefix(local_root)
            .map_err(|e| StoreError::Io {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            })?;
        let key: String = format!("{}/{}", prefix, to_posix(relative));
        let content_type: &'static str = content_type_for(entry.path());

        tasks.push(UploadTask {
            local_path: entry.into_path(),
            key,
            content_type,
        });
    }

    Ok(tasks)
}

/// Join path components with forward slashes.
fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c: Component| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type_for(Path::new("report.json")), "application/json");
        assert_eq!(content_type_for(Path::new("report.html")), "text/html");
        assert_eq!(content_type_for(Path::new("shot.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("font.woff2")), "font/woff2");
        assert_eq!(content_type_for(Path::new("data.bin")), BINARY_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("no_extension")), BINARY_CONTENT_TYPE);
    }

    #[test]
    fn test_collect_upload_tasks_skips_dirs_and_metadata() {
        let temp: TempDir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("shots")).unwrap();
        std::fs::write(temp.path().join("report.html"), "<html>").unwrap();
        std::fs::write(temp.path().join("shots/home.png"), "png").unwrap();
        std::fs::write(temp.path().join("shots/.DS_Store"), "junk").unwrap();

        let mut tasks: Vec<UploadTask> =
            collect_upload_tasks(temp.path(), "bucket/proj/results/dom/qa/ts/").unwrap();
        tasks.sort_by(|a: &UploadTask, b: &UploadTask| a.key.cmp(&b.key));

        let keys: Vec<&str> = tasks.iter().map(|t: &UploadTask| t.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "bucket/proj/results/dom/qa/ts/report.html",
                "bucket/proj/results/dom/qa/ts/shots/home.png",
            ]
        );
        assert_eq!(tasks[0].content_type, "text/html");
        assert_eq!(tasks[1].content_type, "image/png");
    }

    #[test]
    fn test_collect_upload_tasks_empty_tree() {
        let temp: TempDir = TempDir::new().unwrap();
        let tasks: Vec<UploadTask> = collect_upload_tasks(temp.path(), "prefix").unwrap();
        assert!(tasks.is_empty());
    }
}
