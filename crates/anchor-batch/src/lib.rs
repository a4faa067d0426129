//! Batching commit layer for anchor.
//!
//! Writing every document hash to the ledger individually pays one consensus
//! round trip per document. This crate amortizes that cost: producers submit
//! 32-byte leaf digests concurrently, a single control loop accumulates them
//! into batches (sealed by a size threshold or a flush deadline, whichever
//! fires first), builds one Merkle tree per batch, and commits only the root.
//! Every producer then receives the batch root, the ledger transaction id,
//! and an inclusion proof for its own leaf.
//!
//! The loop is the sole owner of the open batch — correctness comes from
//! single-writer serialization over an `mpsc` hand-off channel, not from
//! locking shared batch state.

pub mod batcher;
pub mod config;
pub mod error;
pub mod outcome;

pub use batcher::MerkleBatcher;
pub use config::BatcherConfig;
pub use error::BatchError;
pub use outcome::{BatchOutcome, BatchTiming};
