//! Object store - content-addressed binary storage keyed by name

pub mod memory;
pub mod s3;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// Object store interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, overwriting any existing object at `key`
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Fetch an object's bytes. A missing key is a storage error.
    async fn download(&self, key: &str) -> Result<Bytes>;

    /// Remove an object. Deleting a non-existent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Public URL for an object. Deterministic, performs no I/O.
    fn url_for(&self, key: &str) -> String;
}

/// MIME type for a stored key, by extension. Keys are built from the
/// lowercased extension, so a lowercase match suffices.
pub(crate) fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}
