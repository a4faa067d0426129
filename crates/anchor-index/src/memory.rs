use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use anchor_types::Document;

use crate::error::IndexError;
use crate::traits::DocumentIndex;

/// In-memory document index for tests and benchmark runs.
#[derive(Default)]
pub struct MemoryIndex {
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    async fn save(&self, doc: &Document) -> Result<(), IndexError> {
        self.docs
            .write()
            .expect("index lock poisoned")
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Document, IndexError> {
        self.docs
            .read()
            .expect("index lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(id.to_string()))
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.docs.read().expect("index lock poisoned").len())
    }
}
