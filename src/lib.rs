//! Image Service
//!
//! Content-addressed image ingest with asynchronous thumbnail generation.
//! Uploads are deduplicated by content hash, originals land in object
//! storage, and a background worker derives resized variations through a
//! durable job state machine.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
