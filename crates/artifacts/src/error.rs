//! Error types for artifact store operations.

use thiserror::Error;

/// Errors that can occur while addressing, listing, or transferring artifacts.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// A key segment was empty after slugification.
    #[error("invalid key segment {segment:?}: empty after slugification")]
    InvalidSegment { segment: String },

    /// A key rewrite was requested for a component the key does not contain.
    #[error("cannot rewrite {key}: key has no {component}")]
    UnparsableKey {
        key: String,
        component: &'static str,
    },

    /// A key does not follow the expected layout (nothing after the run timestamp).
    #[error("malformed key {key}: nothing follows the run timestamp")]
    MalformedKey { key: String },

    /// A recency hint could not be resolved to a search prefix.
    #[error("invalid recency hint: {message}")]
    InvalidHint { message: String },

    /// Transport failure during pagination. Aborts the whole listing;
    /// entries from earlier pages are discarded.
    #[error("listing failed under {prefix}: {message}")]
    Listing { prefix: String, message: String },

    /// No key under the search prefix carried a parseable run timestamp.
    /// Callers treat this as "nothing available yet", not a hard failure.
    #[error("no timestamped artifacts under {prefix}")]
    NoTimestampedEntries { prefix: String },

    /// Single-object write failure. Not retried by this layer.
    #[error("write failed for s3://{bucket}/{key}: {message}")]
    StoreWrite {
        bucket: String,
        key: String,
        message: String,
    },

    /// Single-object read failure. Not retried by this layer.
    #[error("read failed for s3://{bucket}/{key}: {message}")]
    StoreRead {
        bucket: String,
        key: String,
        message: String,
    },

    /// Local I/O error.
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// One or more uploads in a batch failed. Carries every key that did
    /// upload alongside the per-file failures (fail-at-end, not fail-fast).
    #[error("{} of {} uploads failed", failures.len(), uploaded.len() + failures.len())]
    PartialUpload {
        uploaded: Vec<String>,
        failures: Vec<UploadFailure>,
    },
}

impl StoreError {
    /// Create an `Io` error from a path and `std::io::Error`.
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error means "no artifacts found" rather than a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, StoreError::NoTimestampedEntries { .. })
    }
}

/// Non-fatal error for a single file within a batch upload.
#[derive(Debug, Clone)]
pub struct UploadFailure {
    /// The local path that failed to upload.
    pub path: String,
    /// The error that occurred.
    pub error: StoreError,
}

impl UploadFailure {
    /// Create a new upload failure.
    pub fn new(path: impl Into<String>, error: StoreError) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_upload_display_counts() {
        let err = StoreError::PartialUpload {
            uploaded: vec!["a".into(), "b".into()],
            failures: vec![UploadFailure::new(
                "c.png",
                StoreError::StoreWrite {
                    bucket: "bucket".into(),
                    key: "c.png".into(),
                    message: "boom".into(),
                },
            )],
        };
        assert_eq!(err.to_string(), "1 of 3 uploads failed");
    }

    #[test]
    fn test_empty_result_classification() {
        let empty = StoreError::NoTimestampedEntries {
            prefix: "p".into(),
        };
        assert!(empty.is_empty_result());

        let fatal = StoreError::Listing {
            prefix: "p".into(),
            message: "timeout".into(),
        };
        assert!(!fatal.is_empty_result());
    }
}
