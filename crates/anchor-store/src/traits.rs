use async_trait::async_trait;

use crate::error::StoreError;

/// Flat key-value store for document bytes.
///
/// The store never interprets object contents; integrity is the service
/// layer's job (it hashes the bytes before they get here). Uploads with the
/// same name overwrite — deduplication is not this layer's concern.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `data` under `name` and return the storage path.
    async fn put(&self, name: &str, data: &[u8]) -> Result<String, StoreError>;

    /// Fetch the bytes stored under `name`.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Whether an object exists under `name`.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
}
