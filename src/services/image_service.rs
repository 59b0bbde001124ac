//! Image service - coordinates ingest, reads, deletes and variation
//! resolution
//!
//! Ingest deduplicates by content hash, stores the original, persists the
//! image together with a pending job, and hands the job to the in-memory
//! queue. Variations are produced either here on demand or by the
//! background worker; both paths share the same generation routine and the
//! same uniqueness invariant.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{
    Image, ImageDetailResponse, ImageResponse, ImageVariation, JobStatusResponse, ThumbnailJob,
    VariationResponse,
};
use crate::services::thumbnail::{ImageProcessor, JobQueue};
use crate::storage::{content_type_for, ObjectStore};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Image service
pub struct ImageService {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    queue: Arc<JobQueue>,
    processor: Arc<ImageProcessor>,
    max_upload_bytes: usize,
}

impl ImageService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        queue: Arc<JobQueue>,
        processor: Arc<ImageProcessor>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            records,
            objects,
            queue,
            processor,
            max_upload_bytes,
        }
    }

    /// Ingest an uploaded image.
    ///
    /// Validates, deduplicates by content hash, uploads the original,
    /// persists the image with a pending job (atomically), and enqueues the
    /// job for the background worker. Returns the new image id.
    pub async fn upload_image(&self, file_name: &str, content: Bytes) -> Result<Uuid> {
        if content.is_empty() {
            return Err(AppError::Validation(
                "File is empty or not provided".to_string(),
            ));
        }
        if content.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.max_upload_bytes
            )));
        }

        let extension = extract_extension(file_name)?;

        let content_hash = hex::encode(Sha256::digest(&content));
        if self.records.image_exists_by_hash(&content_hash).await? {
            return Err(AppError::Validation("Duplicate image content".to_string()));
        }

        let image_id = Uuid::new_v4();
        let storage_key = format!("{image_id}.{extension}");

        // The object goes up before the rows become visible; a crash in
        // between leaves an orphaned object, never a dangling record.
        self.objects
            .upload(&storage_key, content, content_type_for(&storage_key))
            .await?;
        info!(key = %storage_key, "Uploaded original to object store");

        let image = Image::new(image_id, storage_key, content_hash);
        let job = ThumbnailJob::pending(image_id);
        self.records.insert_image_with_job(&image, &job).await?;

        info!(job_id = %job.id, image_id = %image_id, "Enqueuing thumbnail job");
        self.queue.enqueue(job);

        Ok(image_id)
    }

    pub async fn get_image(&self, id: Uuid) -> Result<ImageResponse> {
        let image = self
            .records
            .get_image(id)
            .await?
            .ok_or(AppError::ImageNotFound(id))?;

        Ok(ImageResponse::from_image(
            &image,
            self.objects.url_for(&image.storage_key),
        ))
    }

    pub async fn get_image_with_variations(&self, id: Uuid) -> Result<ImageDetailResponse> {
        let image = self
            .records
            .get_image(id)
            .await?
            .ok_or(AppError::ImageNotFound(id))?;
        let variations = self.records.list_variations(id).await?;

        Ok(ImageDetailResponse {
            id: image.id.to_string(),
            url: self.objects.url_for(&image.storage_key),
            created_at: image.created_at.timestamp(),
            variations: variations
                .into_iter()
                .map(|v| VariationResponse {
                    height: v.height,
                    url: self.objects.url_for(&v.storage_key),
                })
                .collect(),
        })
    }

    /// Resolve the URL of a variation at the requested height, computing it
    /// synchronously if it does not exist yet.
    ///
    /// Repeated requests for the same height are cheap: the stored URL is
    /// returned without touching the resize engine.
    pub async fn get_variation_url(&self, image_id: Uuid, height: u32) -> Result<String> {
        let height = validate_height(height)?;
        let image = self
            .records
            .get_image(image_id)
            .await?
            .ok_or(AppError::ImageNotFound(image_id))?;

        if let Some(existing) = self.records.find_variation(image_id, height).await? {
            debug!(image_id = %image_id, height, "Serving cached variation");
            return Ok(self.objects.url_for(&existing.storage_key));
        }

        let variation = self.generate_variation(&image, height).await?;
        Ok(self.objects.url_for(&variation.storage_key))
    }

    /// Produce the variation for a queued job. Idempotent: an existing
    /// variation at the requested height is left untouched.
    pub async fn create_thumbnail(&self, image_id: Uuid, height: u32) -> Result<()> {
        let height = validate_height(height)?;
        let image = self
            .records
            .get_image(image_id)
            .await?
            .ok_or(AppError::ImageNotFound(image_id))?;

        if self.records.find_variation(image_id, height).await?.is_some() {
            info!(image_id = %image_id, height, "Variation already exists, skipping");
            return Ok(());
        }

        self.generate_variation(&image, height).await?;
        Ok(())
    }

    /// Remove an image, its variations, and every stored object
    pub async fn delete_image(&self, id: Uuid) -> Result<()> {
        let image = self
            .records
            .get_image(id)
            .await?
            .ok_or(AppError::ImageNotFound(id))?;
        let variations = self.records.list_variations(id).await?;

        info!(image_id = %id, variations = variations.len(), "Deleting image");

        self.objects.delete(&image.storage_key).await?;
        for variation in &variations {
            self.objects.delete(&variation.storage_key).await?;
        }

        self.records.delete_image(id).await?;

        info!(image_id = %id, "Deleted image and all variations");
        Ok(())
    }

    pub async fn get_job_status(&self, job_id: Uuid) -> Result<JobStatusResponse> {
        let job = self
            .records
            .get_job(job_id)
            .await?
            .ok_or(AppError::JobNotFound(job_id))?;
        Ok(job.into())
    }

    /// Download the original, resize, upload the result and persist the
    /// variation row. Shared by the on-demand and queued paths.
    async fn generate_variation(&self, image: &Image, height: i32) -> Result<ImageVariation> {
        let original = self.objects.download(&image.storage_key).await?;
        let processed = self
            .processor
            .clone()
            .resize_to_height_async(original, height as u32)
            .await?;

        let storage_key = format!("{}_{}.jpg", image.id, height);
        self.objects
            .upload(&storage_key, processed.data, "image/jpeg")
            .await?;

        let variation = ImageVariation::new(image.id, height, storage_key);
        if self.records.insert_variation(&variation).await? {
            info!(
                image_id = %image.id,
                height,
                width = processed.width,
                "Variation created"
            );
            return Ok(variation);
        }

        // Lost a race with the other generation path; the winner's row is
        // the variation.
        debug!(image_id = %image.id, height, "Variation insert lost race, reusing existing row");
        self.records
            .find_variation(image.id, height)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Variation insert conflicted but no row found".to_string())
            })
    }
}

fn validate_height(height: u32) -> Result<i32> {
    if height == 0 || height > i32::MAX as u32 {
        return Err(AppError::Validation(
            "Height must be a positive integer".to_string(),
        ));
    }
    Ok(height as i32)
}

fn extract_extension(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(AppError::Validation(
            "Invalid file type. Only *.jpg, *.jpeg, and *.png are allowed".to_string(),
        )),
    }
}
