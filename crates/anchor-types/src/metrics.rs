use serde::{Deserialize, Serialize};

/// Fine-grained timing for a single document request.
///
/// All timestamps are Unix nanoseconds (UTC implied). Zero means
/// "not measured / not applicable". The struct is intentionally flat so a
/// CSV row can be produced without any nesting logic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetrics {
    // Whole-request timing (in-process)
    pub req_start_ns: i64,
    pub req_end_ns: i64,

    // Hashing
    pub hash_start_ns: i64,
    pub hash_end_ns: i64,

    // Object storage write
    pub storage_start_ns: i64,
    pub storage_end_ns: i64,

    // Merkle batching (batched mode only)
    pub merkle_enqueue_ns: i64,
    pub merkle_flush_start_ns: i64,
    pub merkle_build_start_ns: i64,
    pub merkle_build_end_ns: i64,
    pub merkle_ledger_start_ns: i64,
    pub merkle_ledger_end_ns: i64,
    pub merkle_response_ns: i64,
    pub merkle_leaf_index: usize,
    pub merkle_batch_size: usize,

    // Per-document ledger write (direct mode only)
    pub ledger_start_ns: i64,
    pub ledger_end_ns: i64,

    // Index save
    pub index_start_ns: i64,
    pub index_end_ns: i64,
}

impl DocumentMetrics {
    /// Whole-request duration in seconds.
    pub fn total_sec(&self) -> f64 {
        span_sec(self.req_start_ns, self.req_end_ns)
    }

    /// Time spent hashing, in seconds.
    pub fn hash_sec(&self) -> f64 {
        span_sec(self.hash_start_ns, self.hash_end_ns)
    }

    /// Time spent in the object store, in seconds.
    pub fn storage_sec(&self) -> f64 {
        span_sec(self.storage_start_ns, self.storage_end_ns)
    }

    /// Per-document ledger round trip (direct mode), in seconds.
    pub fn ledger_sec(&self) -> f64 {
        span_sec(self.ledger_start_ns, self.ledger_end_ns)
    }

    /// Time spent in the index, in seconds.
    pub fn index_sec(&self) -> f64 {
        span_sec(self.index_start_ns, self.index_end_ns)
    }

    /// Time between enqueueing a leaf and receiving its outcome, in seconds.
    pub fn merkle_wait_sec(&self) -> f64 {
        span_sec(self.merkle_enqueue_ns, self.merkle_response_ns)
    }

    /// Tree construction time for the batch this leaf rode in, in seconds.
    pub fn merkle_build_sec(&self) -> f64 {
        span_sec(self.merkle_build_start_ns, self.merkle_build_end_ns)
    }

    /// Ledger round trip for the batch this leaf rode in, in seconds.
    pub fn merkle_ledger_sec(&self) -> f64 {
        span_sec(self.merkle_ledger_start_ns, self.merkle_ledger_end_ns)
    }
}

fn span_sec(start_ns: i64, end_ns: i64) -> f64 {
    if start_ns == 0 || end_ns <= start_ns {
        return 0.0;
    }
    (end_ns - start_ns) as f64 / 1e9
}
