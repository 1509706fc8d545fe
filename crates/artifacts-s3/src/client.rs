//! AWS SDK S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use e2e_artifacts::{ObjectEntry, ObjectPage, ObjectStore, StoreError};

use crate::settings::StoreSettings;

/// `ObjectStore` implementation using the AWS SDK for Rust.
pub struct S3ObjectStore {
    /// The underlying S3 client.
    s3_client: S3Client,
}

impl S3ObjectStore {
    /// Create a new store client.
    ///
    /// Uses the default credential chain unless the settings carry static
    /// credentials.
    pub async fn new(settings: StoreSettings) -> Self {
        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "e2e-artifacts",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        Self {
            s3_client: S3Client::new(&sdk_config),
        }
    }

    /// Create a store from an existing S3 client (for testing).
    pub fn from_client(s3_client: S3Client) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        start_after: Option<&str>,
    ) -> Result<ObjectPage, StoreError> {
        let mut request = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(cursor) = start_after {
            request = request.start_after(cursor);
        }

        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Listing {
                prefix: prefix.to_string(),
                message: err.into_service_error().to_string(),
            })?;

        let entries: Vec<ObjectEntry> = response
            .contents()
            .iter()
            .map(|obj| {
                let last_modified: Option<i64> = obj
                    .last_modified()
                    .and_then(|dt| dt.to_millis().ok())
                    .map(|ms| ms / 1000);

                ObjectEntry {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().map(|s| s as u64).unwrap_or(0),
                    last_modified,
                }
            })
            .collect();

        Ok(ObjectPage {
            entries,
            is_truncated: response.is_truncated() == Some(true),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::StoreRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: err.into_service_error().to_string(),
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|err| StoreError::StoreRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: err.to_string(),
            })?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), StoreError> {
        let mut response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::StoreRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: err.into_service_error().to_string(),
            })?;

        let mut file: File = File::create(dest)
            .await
            .map_err(|e: std::io::Error| StoreError::io(dest.display().to_string(), e))?;

        while let Some(chunk) = response.body.try_next().await.map_err(|err| {
            StoreError::StoreRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: err.to_string(),
            }
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|e: std::io::Error| StoreError::io(dest.display().to_string(), e))?;
        }

        file.flush()
            .await
            .map_err(|e: std::io::Error| StoreError::io(dest.display().to_string(), e))?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.to_vec()));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|err| StoreError::StoreWrite {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: err.into_service_error().to_string(),
            })
    }
}
