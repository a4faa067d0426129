use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// In-memory object store for tests and benchmark runs.
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<String, StoreError> {
        self.objects
            .write()
            .expect("store lock poisoned")
            .insert(name.to_string(), data.to_vec());
        Ok(format!("{}/{}", self.bucket, name))
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .expect("store lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .objects
            .read()
            .expect("store lock poisoned")
            .contains_key(name))
    }
}
