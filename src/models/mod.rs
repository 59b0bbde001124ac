/// Data models for the image service
///
/// This module defines structures for:
/// - Image: an uploaded original, deduplicated by content hash
/// - ImageVariation: a resized derivative at a specific height
/// - ThumbnailJob: the durable status trail of one queued generation request
///
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ========================================
// Image Models
// ========================================

/// Uploaded original image
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: Uuid,
    pub storage_key: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn new(id: Uuid, storage_key: String, content_hash: String) -> Self {
        Self {
            id,
            storage_key,
            content_hash,
            created_at: Utc::now(),
        }
    }
}

/// Resized derivative of an original image
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageVariation {
    pub id: Uuid,
    pub image_id: Uuid,
    pub height: i32,
    pub storage_key: String,
}

impl ImageVariation {
    pub fn new(image_id: Uuid, height: i32, storage_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_id,
            height,
            storage_key,
        }
    }
}

// ========================================
// Job Models
// ========================================

/// Job status in the processing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Durable record tracking one queued thumbnail-generation request.
///
/// Rows are never deleted by the service; they survive image deletion as an
/// audit trail, so `image_id` may reference an image that no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThumbnailJob {
    pub id: Uuid,
    pub image_id: Uuid,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ThumbnailJob {
    /// Create a new job in the `pending` state
    pub fn pending(image_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_id,
            status: JobStatus::Pending.as_str().to_string(),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn get_status(&self) -> JobStatus {
        JobStatus::from_str(&self.status).unwrap_or(JobStatus::Pending)
    }
}

// ========================================
// Response DTOs
// ========================================

/// Image response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: String,
    pub url: String,
    pub created_at: i64,
}

impl ImageResponse {
    pub fn from_image(image: &Image, url: String) -> Self {
        Self {
            id: image.id.to_string(),
            url,
            created_at: image.created_at.timestamp(),
        }
    }
}

/// Variation response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationResponse {
    pub height: i32,
    pub url: String,
}

/// Image response DTO including its variations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDetailResponse {
    pub id: String,
    pub url: String,
    pub created_at: i64,
    pub variations: Vec<VariationResponse>,
}

/// Job status response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub status: String,
    pub error_message: Option<String>,
}

impl From<ThumbnailJob> for JobStatusResponse {
    fn from(job: ThumbnailJob) -> Self {
        Self {
            id: job.id.to_string(),
            status: job.status,
            error_message: job.error_message,
        }
    }
}
