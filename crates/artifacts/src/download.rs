//! Download orchestration for reference artifacts.
//!
//! `download_selection` repopulates the local reference area from a set of
//! remote objects, stripping the `{...}/{timestamp}/` prefix from each key
//! so the local tree mirrors the remote run layout. The reference area is
//! always fully replaced, never merged: stale artifacts from a previous
//! run must not be mistaken for current ones.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::StoreError;
use crate::key::remainder_after_timestamp;
use crate::traits::{ObjectEntry, ObjectStore};
use crate::types::StoreLocation;

/// Default concurrency for parallel downloads.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 10;

/// Subdirectory of the destination root holding downloaded baselines.
pub const REFERENCE_SUBDIR: &str = "results/reference";

/// Options for download operations.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Maximum concurrent downloads.
    pub max_concurrency: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

/// Remote-key to local-path pairing for one selected object.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Remote key to fetch.
    pub key: String,
    /// Local destination file.
    pub dest: PathBuf,
}

/// The reference area under a destination root.
pub fn reference_dir(dest_root: &Path) -> PathBuf {
    dest_root.join(REFERENCE_SUBDIR)
}

/// High-level download operations using any `ObjectStore` implementation.
pub struct DownloadOrchestrator<'a, C: ObjectStore> {
    /// The store to read from.
    store: &'a C,
    /// Bucket/project scoping.
    location: StoreLocation,
    /// Download options.
    options: DownloadOptions,
}

impl<'a, C: ObjectStore> DownloadOrchestrator<'a, C> {
    /// Create a new download orchestrator.
    pub fn new(store: &'a C, location: StoreLocation) -> Self {
        Self {
            store,
            location,
            options: DownloadOptions::default(),
        }
    }

    /// Set download options.
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Download the given entries into the reference area under
    /// `dest_root`, replacing its previous contents entirely.
    ///
    /// Each entry's local path is the portion of its key after the run
    /// timestamp token. A key with no parseable remainder is a structural
    /// mismatch with the expected layout, so the whole batch aborts
    /// (fail-fast, unlike upload) - and it aborts before the reference
    /// area is cleared, leaving the previous baseline intact.
    ///
    /// The caller owns `dest_root` exclusively for the duration of the
    /// call; concurrent invocations against the same root are unsafe.
    pub async fn download_selection(
        &self,
        entries: &[ObjectEntry],
        dest_root: &Path,
    ) -> Result<(), StoreError> {
        let reference: PathBuf = reference_dir(dest_root);

        // Map every key before touching the filesystem.
        let tasks: Vec<DownloadTask> = entries
            .iter()
            .map(|entry: &ObjectEntry| {
                let rest: &str = remainder_after_timestamp(&entry.key).ok_or(
                    StoreError::MalformedKey {
                        key: entry.key.clone(),
                    },
                )?;
                Ok(DownloadTask {
                    key: entry.key.clone(),
                    dest: reference.join(rest),
                })
            })
            .collect::<Result<Vec<DownloadTask>, StoreError>>()?;

        reset_dir(&reference)?;

        let max_concurrency: usize = self.options.max_concurrency.max(1);
        let results: Vec<Result<(), StoreError>> = stream::iter(tasks)
            .map(|task: DownloadTask| async move { self.download_task(&task).await })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        // Join barrier: every transfer has settled; surface the first failure.
        for result in results {
            result?;
        }

        Ok(())
    }

    /// Stream one object to its local destination.
    async fn download_task(&self, task: &DownloadTask) -> Result<(), StoreError> {
        debug!(key = %task.key, "downloading");

        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e: std::io::Error| StoreError::io(parent.display().to_string(), e))?;
        }

        self.store
            .get_object_to_file(&self.location.bucket, &task.key, &task.dest)
            .await?;

        debug!(key = %task.key, dest = %task.dest.display(), "downloaded");
        Ok(())
    }
}

/// Empty and recreate a directory.
fn reset_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .map_err(|e: std::io::Error| StoreError::io(dir.display().to_string(), e))?;
    }
    std::fs::create_dir_all(dir)
        .map_err(|e: std::io::Error| StoreError::io(dir.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reference_dir_layout() {
        assert_eq!(
            reference_dir(Path::new("/work")),
            Path::new("/work/results/reference")
        );
    }

    #[test]
    fn test_reset_dir_replaces_contents() {
        let temp: TempDir = TempDir::new().unwrap();
        let dir: PathBuf = temp.path().join("reference");
        std::fs::create_dir_all(dir.join("old")).unwrap();
        std::fs::write(dir.join("old/stale.png"), "stale").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_dir_creates_missing() {
        let temp: TempDir = TempDir::new().unwrap();
        let dir: PathBuf = temp.path().join("brand/new/reference");
        reset_dir(&dir).unwrap();
        assert!(dir.exists());
    }
}
