//! Connection settings for the S3 backend.

/// Configuration for creating an [`crate::S3ObjectStore`].
///
/// Retry and timeout policy are deliberately absent: they belong to the
/// transport, not this layer.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// AWS region.
    pub region: String,
    /// Static credentials; the default credential chain is used when absent.
    pub credentials: Option<StaticCredentials>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            credentials: None,
        }
    }
}

/// Static AWS credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}
