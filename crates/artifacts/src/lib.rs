//! Artifact storage and retrieval for browser-based end-to-end test runs.
//!
//! This crate is the store-agnostic core of a test-run artifact
//! repository: screenshots, visual-diff images, crawl snapshots, and
//! generated reports land in a remote object store under a fixed key
//! namespace and are recovered later by run recency. It provides:
//!
//! - **Key codec** - building and parsing artifact keys with an embedded
//!   run timestamp token, the only selection axis in the flat namespace
//! - **Lister** - sequential cursor-driven pagination behind one
//!   "list everything under a prefix" operation
//! - **Recency selector** - inference of the most recent completed run
//!   from a set of timestamped keys, with optional narrowing hints
//! - **Upload orchestrator** - concurrent directory-tree uploads with
//!   fail-at-end partial-failure aggregation
//! - **Download orchestrator** - concurrent, fail-fast repopulation of
//!   the local reference area from a selected run
//!
//! The object store itself is behind the [`ObjectStore`] trait and passed
//! in explicitly; the `e2e-artifacts-s3` crate provides the AWS SDK
//! implementation. This layer never retries: retry, if desired, is the
//! caller's responsibility.

pub mod download;
pub mod error;
pub mod key;
pub mod list;
pub mod recency;
pub mod traits;
pub mod types;
pub mod upload;

pub use download::{
    reference_dir, DownloadOptions, DownloadOrchestrator, DownloadTask,
    DEFAULT_DOWNLOAD_CONCURRENCY, REFERENCE_SUBDIR,
};
pub use error::{StoreError, UploadFailure};
pub use key::{
    build_key, parse_filename, remainder_after_timestamp, rewrite_key, slugify, Category,
    RunTimestamp, TIMESTAMP_FORMAT,
};
pub use list::{list_all, page_stream, LIST_PAGE_SIZE};
pub use recency::{RecencyHint, RecencySelector, RunBucket};
pub use traits::{ObjectEntry, ObjectPage, ObjectStore};
pub use types::{StoreLocation, DEFAULT_STORE_HOST};
pub use upload::{
    collect_upload_tasks, content_type_for, UploadOptions, UploadOrchestrator, UploadTask,
    BINARY_CONTENT_TYPE, DEFAULT_UPLOAD_CONCURRENCY, OS_METADATA_FILES,
};
