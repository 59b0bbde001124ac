//! Image service worker process
//!
//! Wires configuration, the PostgreSQL record store, the S3 object store,
//! the in-memory job queue and the background thumbnail worker, then runs
//! the worker until a shutdown signal arrives. Persisted pending jobs are
//! re-enqueued before the loop starts, since the queue itself does not
//! survive restarts.
//!
//! Environment variables (all optional, with defaults):
//! - DATABASE_URL, DATABASE_MAX_CONNECTIONS
//! - S3_BUCKET, AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
//!   S3_ENDPOINT, S3_PUBLIC_BASE_URL
//! - UPLOAD_MAX_BYTES
//! - WORKER_THUMBNAIL_HEIGHT, WORKER_JPEG_QUALITY,
//!   WORKER_POLL_INTERVAL_MS, WORKER_ERROR_BACKOFF_MS

use anyhow::Context;
use image_service::config::Config;
use image_service::db::{PgRecordStore, RecordStore};
use image_service::services::thumbnail::{
    recover_pending_jobs, ImageProcessor, JobQueue, ThumbnailWorker,
};
use image_service::services::ImageService;
use image_service::storage::{ObjectStore, S3ObjectStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting image service worker");

    dotenvy::dotenv().ok();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(
        bucket = %config.s3.bucket,
        thumbnail_height = config.worker.thumbnail_height,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let records: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_config(&config.s3).await?);
    let queue = Arc::new(JobQueue::new());
    let processor = Arc::new(ImageProcessor::new(config.worker.jpeg_quality));

    let service = Arc::new(ImageService::new(
        records.clone(),
        objects,
        queue.clone(),
        processor,
        config.upload.max_bytes,
    ));

    let recovered = recover_pending_jobs(records.as_ref(), &queue).await?;
    info!(recovered, "Startup reconciliation complete");

    // Graceful shutdown on SIGINT
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let worker = ThumbnailWorker::new(
        service,
        records,
        queue,
        config.worker.clone(),
        shutdown_rx,
    );
    worker.run().await;

    Ok(())
}
