use thiserror::Error;

use anchor_batch::BatchError;
use anchor_crypto::MerkleError;
use anchor_index::IndexError;
use anchor_ledger::LedgerError;
use anchor_store::StoreError;

/// Errors produced by the document pipeline.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("batched mode requested but no batcher is configured")]
    BatcherNotConfigured,

    #[error("anchoring failed: {0}")]
    Anchoring(String),

    #[error("submission error: {0}")]
    Batch(#[from] BatchError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("proof error: {0}")]
    Proof(#[from] MerkleError),
}
