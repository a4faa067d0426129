use anchor_types::Digest;
use sha2::{Digest as _, Sha256};

/// Algorithm label for leaf hashes, as recorded in batch-commit metadata.
pub const LEAF_ALGO: &str = "sha256(file_bytes)";

/// Algorithm label for internal node hashes, as recorded in batch-commit
/// metadata. A reader holding the root can reconstruct the tree shape from
/// these two labels plus the leaf count.
pub const NODE_ALGO: &str = "sha256(l||r)";

/// Parent hash of two sibling nodes: `sha256(left || right)`.
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest::from_hash(hasher.finalize().into())
}
