//! Service layer

pub mod image_service;
pub mod thumbnail;

pub use image_service::ImageService;
pub use thumbnail::{ImageProcessor, JobQueue, ThumbnailWorker};
