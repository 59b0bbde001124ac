//! In-memory object store for local development and tests

use crate::error::{AppError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory implementation of [`ObjectStore`]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
    base_url: String,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: "memory://images".to_string(),
        }
    }
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .expect("object store lock poisoned")
            .contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects
            .read()
            .expect("object store lock poisoned")
            .len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> Result<()> {
        self.objects
            .write()
            .expect("object store lock poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Bytes> {
        self.objects
            .read()
            .expect("object store lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("object not found: {key}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects
            .write()
            .expect("object store lock poisoned")
            .remove(key);
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
