//! PostgreSQL-backed record store

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{Image, ImageVariation, JobStatus, ThumbnailJob};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of [`RecordStore`].
///
/// The schema (see `migrations/`) carries the uniqueness constraints, so
/// concurrent check-then-insert callers race safely: the losing insert is
/// rejected by the database and mapped back to the same outcome as a
/// pre-check hit.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_image_with_job(&self, image: &Image, job: &ThumbnailJob) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO images (id, storage_key, content_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(image.id)
        .bind(&image.storage_key)
        .bind(&image.content_hash)
        .bind(image.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_duplicate_hash)?;

        sqlx::query(
            r#"
            INSERT INTO thumbnail_jobs (id, image_id, status, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(job.id)
        .bind(job.image_id)
        .bind(&job.status)
        .bind(&job.error_message)
        .bind(job.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn image_exists_by_hash(&self, content_hash: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM images WHERE content_hash = $1)")
                .bind(content_hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, storage_key, content_hash, created_at FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool> {
        // Variation rows go with the image via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_variation(&self, variation: &ImageVariation) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO image_variations (id, image_id, height, storage_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (image_id, height) DO NOTHING
            "#,
        )
        .bind(variation.id)
        .bind(variation.image_id)
        .bind(variation.height)
        .bind(&variation.storage_key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_variation(
        &self,
        image_id: Uuid,
        height: i32,
    ) -> Result<Option<ImageVariation>> {
        let variation = sqlx::query_as::<_, ImageVariation>(
            r#"
            SELECT id, image_id, height, storage_key
            FROM image_variations
            WHERE image_id = $1 AND height = $2
            "#,
        )
        .bind(image_id)
        .bind(height)
        .fetch_optional(&self.pool)
        .await?;
        Ok(variation)
    }

    async fn list_variations(&self, image_id: Uuid) -> Result<Vec<ImageVariation>> {
        let variations = sqlx::query_as::<_, ImageVariation>(
            r#"
            SELECT id, image_id, height, storage_key
            FROM image_variations
            WHERE image_id = $1
            ORDER BY height ASC
            "#,
        )
        .bind(image_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(variations)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ThumbnailJob>> {
        let job = sqlx::query_as::<_, ThumbnailJob>(
            r#"
            SELECT id, image_id, status, error_message, created_at
            FROM thumbnail_jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE thumbnail_jobs SET status = $2, error_message = $3 WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .bind(error_message)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::JobNotFound(id));
        }
        Ok(())
    }

    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<ThumbnailJob>> {
        let jobs = sqlx::query_as::<_, ThumbnailJob>(
            r#"
            SELECT id, image_id, status, error_message, created_at
            FROM thumbnail_jobs
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}

/// The content-hash constraint is the authoritative duplicate signal; a
/// losing concurrent insert gets the same error as the pre-check.
fn map_duplicate_hash(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("Duplicate image content".to_string())
        }
        _ => AppError::from(err),
    }
}
