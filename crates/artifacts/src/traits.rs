//! Object-store trait consumed by listing and transfer orchestration.
//!
//! The store client is an explicitly passed dependency, never process-wide
//! state, so every operation can run against a test double.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StoreError;

/// Descriptor for a remote object from list operations.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
}

/// One page of list results.
///
/// Transient: produced by a single `list_page` call and consumed
/// immediately. The continuation cursor for the next page is the key of
/// the last entry (start-after semantics).
#[derive(Debug, Clone)]
pub struct ObjectPage {
    /// Entries in this page, in key order.
    pub entries: Vec<ObjectEntry>,
    /// Whether more pages exist after this one.
    pub is_truncated: bool,
}

/// Low-level object store operations - implemented by each backend.
///
/// Implementations map their transport failures onto `StoreError::Listing`,
/// `StoreError::StoreRead`, and `StoreError::StoreWrite`. No retry happens
/// at this layer or above it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List up to `max_keys` objects under `prefix`, starting after the
    /// given key. `start_after` absent means the start of the prefix.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        start_after: Option<&str>,
    ) -> Result<ObjectPage, StoreError>;

    /// Download an object into memory.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Stream an object directly to a local file.
    async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), StoreError>;

    /// Upload bytes with an optional content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), StoreError>;
}
