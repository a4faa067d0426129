use anchor_crypto::MerkleProof;
use anchor_types::Digest;

/// Timestamps collected across one leaf's journey through a flush.
///
/// All values are Unix nanoseconds; zero means the phase was never reached.
/// Every leaf in a batch shares the flush/build/ledger marks — only
/// `enqueue_ns` and `response_ns` are per-leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchTiming {
    pub enqueue_ns: i64,
    pub flush_start_ns: i64,
    pub build_start_ns: i64,
    pub build_end_ns: i64,
    pub ledger_start_ns: i64,
    pub ledger_end_ns: i64,
    pub response_ns: i64,
}

/// What a producer receives once the batch containing its leaf resolves.
///
/// On a committed batch, `root`, `tx_id`, and `proof` are all populated and
/// every outcome of the flush shares the same root and transaction id. On a
/// failed batch every leaf receives the identical `failure` string and no
/// proof — there is no partial success within a batch. Timing is populated
/// in both cases so experiments can account for failed round trips.
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    /// Root digest the batch was committed under.
    pub root: Option<Digest>,
    /// Ledger transaction id for the batch commit.
    pub tx_id: Option<String>,
    /// This leaf's position in the batch, in arrival order.
    pub index: usize,
    /// Number of leaves sealed into the batch.
    pub batch_size: usize,
    /// Inclusion proof for this leaf under `root`.
    pub proof: Option<MerkleProof>,
    /// Why the batch failed, if it did. Shared verbatim by every leaf of the
    /// flush.
    pub failure: Option<String>,
    pub timing: BatchTiming,
}

impl BatchOutcome {
    /// `true` if the batch this leaf rode in reached the ledger.
    pub fn is_committed(&self) -> bool {
        self.failure.is_none()
    }
}
