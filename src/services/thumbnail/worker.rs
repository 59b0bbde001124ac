//! Background worker for queued thumbnail generation
//!
//! Pulls jobs off the in-memory queue and drives each through the
//! `pending -> in_progress -> completed | failed` state machine. The
//! `in_progress` transition is persisted before any resize work starts, so
//! observers get a true "work has begun" signal even if the process dies
//! mid-job.
//!
//! Failure handling is two-tier: a job's own failure (invalid resize,
//! corrupt bytes, storage trouble) is captured into its `failed` row and
//! the loop moves on; a failure to write job status at all is logged and
//! followed by a longer backoff. Only the cancellation signal stops the
//! loop.

use crate::config::WorkerConfig;
use crate::db::RecordStore;
use crate::error::Result;
use crate::models::{JobStatus, ThumbnailJob};
use crate::services::image_service::ImageService;
use crate::services::thumbnail::JobQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Background thumbnail worker
pub struct ThumbnailWorker {
    service: Arc<ImageService>,
    records: Arc<dyn RecordStore>,
    queue: Arc<JobQueue>,
    config: WorkerConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl ThumbnailWorker {
    pub fn new(
        service: Arc<ImageService>,
        records: Arc<dyn RecordStore>,
        queue: Arc<JobQueue>,
        config: WorkerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            records,
            queue,
            config,
            shutdown_rx,
        }
    }

    /// Run until the shutdown signal is observed.
    ///
    /// Cancellation is cooperative: it is checked at the top of each
    /// iteration and interrupts idle waits, but a job already being
    /// processed runs to completion.
    pub async fn run(mut self) {
        info!(
            thumbnail_height = self.config.thumbnail_height,
            poll_interval_ms = self.config.poll_interval_ms,
            "Thumbnail worker started"
        );

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            match self.queue.try_dequeue() {
                Some(job) => {
                    info!(job_id = %job.id, image_id = %job.image_id, "Processing thumbnail job");
                    if let Err(e) = self.process_job(&job).await {
                        error!(job_id = %job.id, error = %e, "Failed to record job outcome");
                        self.wait(self.config.error_backoff()).await;
                    }
                }
                None => self.wait(self.config.poll_interval()).await,
            }
        }

        info!("Thumbnail worker stopped");
    }

    /// Drive one job through its state machine.
    ///
    /// Returns an error only when the record store itself fails; the job's
    /// own resize failure ends up in its `failed` row.
    async fn process_job(&self, job: &ThumbnailJob) -> Result<()> {
        self.records
            .update_job_status(job.id, JobStatus::InProgress, None)
            .await?;

        match self
            .service
            .create_thumbnail(job.image_id, self.config.thumbnail_height)
            .await
        {
            Ok(()) => {
                self.records
                    .update_job_status(job.id, JobStatus::Completed, None)
                    .await?;
                info!(job_id = %job.id, "Thumbnail job completed");
            }
            Err(e) => {
                warn!(job_id = %job.id, image_id = %job.image_id, error = %e, "Thumbnail job failed");
                self.records
                    .update_job_status(job.id, JobStatus::Failed, Some(&e.to_string()))
                    .await?;
            }
        }

        Ok(())
    }

    /// Sleep, waking early on shutdown
    async fn wait(&mut self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown_rx.changed() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

/// Re-enqueue every persisted `pending` job.
///
/// The queue does not survive a restart while the record store does; this
/// sweep runs at startup so jobs accepted before the restart still get
/// processed.
pub async fn recover_pending_jobs(records: &dyn RecordStore, queue: &JobQueue) -> Result<usize> {
    let pending = records.list_jobs_by_status(JobStatus::Pending).await?;
    let count = pending.len();

    for job in pending {
        queue.enqueue(job);
    }

    if count > 0 {
        info!(count, "Re-enqueued persisted pending jobs");
    }
    Ok(count)
}
