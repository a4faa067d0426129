use thiserror::Error;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("digest not found in ledger")]
    NotFound,

    #[error("ledger rejected the write: {0}")]
    WriteRejected(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
