use thiserror::Error;

/// Errors returned directly from [`MerkleBatcher::add`](crate::MerkleBatcher::add).
///
/// Ledger-side failures are not here: those surface in
/// [`BatchOutcome::failure`](crate::BatchOutcome) so that timing data is
/// still delivered to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("leaf hash must be {expected} bytes (raw sha256), got {actual}")]
    InvalidLeafLength { expected: usize, actual: usize },

    #[error("batcher is closed")]
    Closed,
}
