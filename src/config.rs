/// Configuration management for the image service
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub s3: S3Config,
    pub upload: UploadConfig,
    pub worker: WorkerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    /// Base URL served to clients instead of the virtual-hosted bucket URL
    /// (CDN or MinIO fronting).
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkerConfig {
    /// The single fixed height generated for every new upload.
    pub thumbnail_height: u32,
    /// JPEG quality (0-100) for re-encoded variations.
    pub jpeg_quality: u8,
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thumbnail_height: 160,
            jpeg_quality: 85,
            poll_interval_ms: 1000,
            error_backoff_ms: 2000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/images".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            s3: S3Config {
                bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "images".to_string()),
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
                public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok(),
            },
            upload: UploadConfig {
                max_bytes: std::env::var("UPLOAD_MAX_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10 * 1024 * 1024),
            },
            worker: WorkerConfig {
                thumbnail_height: std::env::var("WORKER_THUMBNAIL_HEIGHT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(160),
                jpeg_quality: std::env::var("WORKER_JPEG_QUALITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(85),
                poll_interval_ms: std::env::var("WORKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
                error_backoff_ms: std::env::var("WORKER_ERROR_BACKOFF_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2000),
            },
        })
    }
}
