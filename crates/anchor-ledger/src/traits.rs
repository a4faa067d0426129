use async_trait::async_trait;

use crate::error::LedgerError;

/// Minimal contract the batching layer requires from the ledger.
///
/// Both calls are single round trips against the consensus log. A write may
/// take orders of magnitude longer than any in-process work — that cost is
/// exactly what batching amortizes. The batch scheduler serializes its own
/// flushes, so implementations are never invoked concurrently from more than
/// one flush at a time.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Commit a hex-encoded 256-bit digest plus a free-form metadata string.
    /// Returns the ledger's transaction id for the commit.
    async fn write(&self, digest_hex: &str, metadata: &str) -> Result<String, LedgerError>;

    /// Look up the metadata previously committed for a digest. Used by
    /// verification flows, never by the batching path.
    async fn read(&self, digest_hex: &str) -> Result<String, LedgerError>;
}
