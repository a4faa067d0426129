use thiserror::Error;

/// Errors produced by index operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("index backend error: {0}")]
    Backend(String),
}
