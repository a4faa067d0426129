use async_trait::async_trait;

use anchor_types::Document;

use crate::error::IndexError;

/// Lookup boundary over document metadata records.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Insert or replace the record with `doc.id`.
    async fn save(&self, doc: &Document) -> Result<(), IndexError>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Document, IndexError>;

    /// Number of records currently indexed.
    async fn count(&self) -> Result<usize, IndexError>;
}
