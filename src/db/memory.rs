//! In-memory record store for local development and tests
//!
//! Mirrors the PostgreSQL implementation's semantics: duplicate content
//! hashes are rejected, variation inserts lose to an existing
//! `(image_id, height)` row, and deleting an image cascades to its
//! variations while leaving job rows in place.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{Image, ImageVariation, JobStatus, ThumbnailJob};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    images: HashMap<Uuid, Image>,
    variations: HashMap<Uuid, ImageVariation>,
    jobs: HashMap<Uuid, ThumbnailJob>,
}

/// In-memory implementation of [`RecordStore`]
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_image_with_job(&self, image: &Image, job: &ThumbnailJob) -> Result<()> {
        let mut tables = self.tables.lock().expect("record store lock poisoned");
        if tables
            .images
            .values()
            .any(|i| i.content_hash == image.content_hash)
        {
            return Err(AppError::Validation("Duplicate image content".to_string()));
        }
        tables.images.insert(image.id, image.clone());
        tables.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn image_exists_by_hash(&self, content_hash: &str) -> Result<bool> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        Ok(tables
            .images
            .values()
            .any(|i| i.content_hash == content_hash))
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        Ok(tables.images.get(&id).cloned())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().expect("record store lock poisoned");
        if tables.images.remove(&id).is_none() {
            return Ok(false);
        }
        tables.variations.retain(|_, v| v.image_id != id);
        Ok(true)
    }

    async fn insert_variation(&self, variation: &ImageVariation) -> Result<bool> {
        let mut tables = self.tables.lock().expect("record store lock poisoned");
        let exists = tables
            .variations
            .values()
            .any(|v| v.image_id == variation.image_id && v.height == variation.height);
        if exists {
            return Ok(false);
        }
        tables.variations.insert(variation.id, variation.clone());
        Ok(true)
    }

    async fn find_variation(
        &self,
        image_id: Uuid,
        height: i32,
    ) -> Result<Option<ImageVariation>> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        Ok(tables
            .variations
            .values()
            .find(|v| v.image_id == image_id && v.height == height)
            .cloned())
    }

    async fn list_variations(&self, image_id: Uuid) -> Result<Vec<ImageVariation>> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        let mut variations: Vec<ImageVariation> = tables
            .variations
            .values()
            .filter(|v| v.image_id == image_id)
            .cloned()
            .collect();
        variations.sort_by_key(|v| v.height);
        Ok(variations)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ThumbnailJob>> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        Ok(tables.jobs.get(&id).cloned())
    }

    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut tables = self.tables.lock().expect("record store lock poisoned");
        let job = tables.jobs.get_mut(&id).ok_or(AppError::JobNotFound(id))?;
        job.status = status.as_str().to_string();
        job.error_message = error_message.map(|m| m.to_string());
        Ok(())
    }

    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<ThumbnailJob>> {
        let tables = self.tables.lock().expect("record store lock poisoned");
        let mut jobs: Vec<ThumbnailJob> = tables
            .jobs
            .values()
            .filter(|j| j.get_status() == status)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_hash(hash: &str) -> Image {
        let id = Uuid::new_v4();
        Image::new(id, format!("{id}.png"), hash.to_string())
    }

    #[tokio::test]
    async fn test_duplicate_hash_rejected() {
        let store = InMemoryRecordStore::new();
        let first = image_with_hash("abc123");
        let second = image_with_hash("abc123");

        store
            .insert_image_with_job(&first, &ThumbnailJob::pending(first.id))
            .await
            .unwrap();
        let err = store
            .insert_image_with_job(&second, &ThumbnailJob::pending(second.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.image_exists_by_hash("abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_variation_insert_loses_to_existing_row() {
        let store = InMemoryRecordStore::new();
        let image_id = Uuid::new_v4();

        let first = ImageVariation::new(image_id, 100, format!("{image_id}_100.jpg"));
        let second = ImageVariation::new(image_id, 100, format!("{image_id}_100.jpg"));

        assert!(store.insert_variation(&first).await.unwrap());
        assert!(!store.insert_variation(&second).await.unwrap());

        let found = store.find_variation(image_id, 100).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_delete_cascades_variations_but_keeps_jobs() {
        let store = InMemoryRecordStore::new();
        let image = image_with_hash("feed");
        let job = ThumbnailJob::pending(image.id);
        store.insert_image_with_job(&image, &job).await.unwrap();
        store
            .insert_variation(&ImageVariation::new(image.id, 80, "k".to_string()))
            .await
            .unwrap();

        assert!(store.delete_image(image.id).await.unwrap());
        assert!(store.get_image(image.id).await.unwrap().is_none());
        assert!(store.list_variations(image.id).await.unwrap().is_empty());
        assert!(store.get_job(job.id).await.unwrap().is_some());

        // Idempotence of a second delete is the caller's concern; the row
        // is simply gone.
        assert!(!store.delete_image(image.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_jobs_by_status_oldest_first() {
        let store = InMemoryRecordStore::new();
        let a = image_with_hash("a");
        let b = image_with_hash("b");
        let job_a = ThumbnailJob::pending(a.id);
        let job_b = ThumbnailJob::pending(b.id);
        store.insert_image_with_job(&a, &job_a).await.unwrap();
        store.insert_image_with_job(&b, &job_b).await.unwrap();

        store
            .update_job_status(job_a.id, JobStatus::Completed, None)
            .await
            .unwrap();

        let pending = store.list_jobs_by_status(JobStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, job_b.id);
    }
}
