//! Thumbnail generation
//!
//! This module provides the asynchronous variation pipeline:
//! - Image processor for resizing and JPEG encoding
//! - In-memory job queue handing jobs from ingest to the worker
//! - Background worker driving the job state machine

pub mod processor;
pub mod queue;
pub mod worker;

pub use processor::{ImageProcessor, ProcessedImage};
pub use queue::JobQueue;
pub use worker::{recover_pending_jobs, ThumbnailWorker};
