//! Error types for the image service.

use thiserror::Error;
use uuid::Uuid;

/// Result type for image-service operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors that can occur across the ingest, resolver and worker paths.
#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected at the ingest boundary: empty or oversized content, a
    /// disallowed extension, or duplicate content.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No image with the given id exists
    #[error("Image not found: {0}")]
    ImageNotFound(Uuid),

    /// No job with the given id exists
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Requested variation cannot be produced from the source image
    #[error("Invalid resize: {0}")]
    InvalidResize(String),

    /// Record store operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Object store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else: corrupt image bytes, task panics, misconfiguration
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error is correctable by the caller, as opposed to an
    /// infrastructure failure that should surface as an opaque internal
    /// error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::ImageNotFound(_)
                | AppError::JobNotFound(_)
                | AppError::InvalidResize(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::Validation("empty file".into()).is_client_error());
        assert!(AppError::ImageNotFound(Uuid::new_v4()).is_client_error());
        assert!(AppError::InvalidResize("too tall".into()).is_client_error());
        assert!(!AppError::Database("connection refused".into()).is_client_error());
        assert!(!AppError::Storage("bucket missing".into()).is_client_error());
        assert!(!AppError::Internal("decode failed".into()).is_client_error());
    }
}
