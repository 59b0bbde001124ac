//! S3-backed object store
//!
//! Works against AWS S3 or any S3-compatible endpoint (MinIO) via the
//! optional `S3_ENDPOINT` override.

use crate::config::S3Config;
use crate::error::{AppError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

/// S3 implementation of [`ObjectStore`]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    public_base_url: Option<String>,
}

impl S3ObjectStore {
    pub fn new(client: Client, config: &S3Config) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            public_base_url: config
                .public_base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    /// Build an S3 client from config and wrap it.
    ///
    /// Falls back to the default AWS credential chain when no static
    /// credentials are configured.
    pub async fn from_config(config: &S3Config) -> Result<Self> {
        use aws_sdk_s3::config::Region;

        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            use aws_sdk_s3::config::Credentials;

            let credentials =
                Credentials::new(access_key_id, secret_access_key, None, None, "image_service");
            builder = builder.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let aws_config = builder.load().await;
        let client = Client::new(&aws_config);

        info!(bucket = %config.bucket, region = %config.region, "S3 client initialized");
        Ok(Self::new(client, config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        debug!(key = %key, size = data.len(), "Uploading to S3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("NoSuchBucket") {
                    AppError::Storage(format!("S3 bucket not found: {}", self.bucket))
                } else {
                    AppError::Storage(format!("S3 upload failed: {msg}"))
                }
            })?;

        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("NoSuchKey") || msg.contains("NotFound") {
                    AppError::Storage(format!("object not found: {key}"))
                } else {
                    AppError::Storage(format!("S3 download failed: {msg}"))
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read S3 object body: {e}")))?
            .into_bytes();

        debug!(key = %key, size = bytes.len(), "Downloaded from S3");
        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // DeleteObject succeeds for missing keys, which keeps this idempotent
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{key}"),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}
