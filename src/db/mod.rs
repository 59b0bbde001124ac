//! Record store - durable storage for images, variations and jobs
//!
//! The store is the single source of truth and enforces the two uniqueness
//! invariants itself: `images.content_hash` and `(image_id, height)` on
//! variations. Relations are navigated through explicit id-based queries,
//! never through loaded object graphs.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{Image, ImageVariation, JobStatus, ThumbnailJob};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

/// Record store interface
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new image together with its pending job. Both rows become
    /// visible atomically, so a worker that dequeues the job can always
    /// find its image. A content-hash conflict surfaces as the duplicate
    /// validation error.
    async fn insert_image_with_job(&self, image: &Image, job: &ThumbnailJob) -> Result<()>;

    /// Whether any image with the given content hash exists
    async fn image_exists_by_hash(&self, content_hash: &str) -> Result<bool>;

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>>;

    /// Delete an image row, cascading to its variation rows. Returns false
    /// if no such image existed. Job rows are left untouched.
    async fn delete_image(&self, id: Uuid) -> Result<bool>;

    /// Insert a variation unless one already exists for the same
    /// `(image_id, height)` pair. Returns false when the insert lost to an
    /// existing row; the caller then re-reads the winner.
    async fn insert_variation(&self, variation: &ImageVariation) -> Result<bool>;

    async fn find_variation(&self, image_id: Uuid, height: i32)
        -> Result<Option<ImageVariation>>;

    /// All variations of an image, ordered by height
    async fn list_variations(&self, image_id: Uuid) -> Result<Vec<ImageVariation>>;

    async fn get_job(&self, id: Uuid) -> Result<Option<ThumbnailJob>>;

    /// Record a job status transition, replacing the stored error message
    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// All jobs currently in the given status, oldest first. Used by the
    /// startup sweep that re-enqueues persisted pending jobs.
    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<ThumbnailJob>>;
}
