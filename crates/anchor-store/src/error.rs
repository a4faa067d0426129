use thiserror::Error;

/// Errors produced by object store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}
