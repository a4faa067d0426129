use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Metadata record kept for each processed document.
///
/// `anchored_root`, `leaf_index`, `batch_size`, and `proof_json` are only
/// populated when the document went through the batching path; a directly
/// anchored document commits its own file hash and carries no proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique record id, `doc-<unix_ns>-<hash prefix>`.
    pub id: String,
    pub filename: String,
    /// SHA-256 of the file bytes.
    pub file_hash: Digest,
    /// Where the object store placed the bytes.
    pub storage_path: String,
    /// Ledger transaction id for the commit that anchored this document.
    pub ledger_tx_id: String,
    /// Root of the batch this document's hash was committed under, if batched.
    pub anchored_root: Option<Digest>,
    /// Index of this document's leaf within its batch, if batched.
    pub leaf_index: Option<usize>,
    /// Number of leaves in the batch, if batched.
    pub batch_size: Option<usize>,
    /// Serialized inclusion proof (JSON), if batched.
    pub proof_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Derive a record id from the creation time and file hash.
    pub fn make_id(created_at: DateTime<Utc>, file_hash: &Digest) -> String {
        let ns = created_at.timestamp_nanos_opt().unwrap_or_default();
        format!("doc-{}-{}", ns, file_hash.short_hex())
    }
}
