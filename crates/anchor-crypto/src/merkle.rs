use serde::{Deserialize, Serialize};

use anchor_types::Digest;

use crate::error::MerkleError;
use crate::hasher::hash_pair;

/// Side of a sibling in a Merkle proof path.
///
/// `Left` means the sibling is concatenated before the running hash
/// (`sha256(sibling || current)`), `Right` means after
/// (`sha256(current || sibling)`). Serialized as `"L"` / `"R"` — this is part
/// of the wire contract consumed by external auditors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

/// One step of an inclusion proof: a hex-encoded sibling hash and which side
/// of the running hash it sits on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling_hash: String,
    pub side: Side,
}

/// Sibling path from one leaf up to the root.
///
/// A proof is independent of the tree it came from: leaf hash + proof + claimed
/// root are sufficient for verification with no ledger access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Number of steps: one per tree level below the root.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Serialize to the canonical JSON wire shape:
    /// `[{"sibling_hash": "<hex>", "side": "L"|"R"}, ...]`.
    pub fn to_json(&self) -> Result<String, MerkleError> {
        serde_json::to_string(self).map_err(|e| MerkleError::InvalidProofEncoding(e.to_string()))
    }

    /// Parse from the JSON wire shape. Unknown side markers and structural
    /// mismatches are rejected here, before any hashing happens.
    pub fn from_json(s: &str) -> Result<Self, MerkleError> {
        serde_json::from_str(s).map_err(|e| MerkleError::InvalidProofEncoding(e.to_string()))
    }
}

/// Binary hash tree over a batch of leaf digests.
///
/// Level 0 holds the leaves in arrival order; each level above pairs
/// consecutive nodes with `sha256(left || right)`. An odd-length level pairs
/// its last node with itself (Bitcoin-style duplication), so every internal
/// level has an even branching factor. Construction continues until a single
/// root remains.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// All levels, leaves first, root level (length 1) last.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build the full tree from an ordered, non-empty list of leaves.
    pub fn build(leaves: &[Digest]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyLeaves);
        }

        let mut current = leaves.to_vec();
        let mut levels = vec![current.clone()];

        while current.len() > 1 {
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                let parent = if pair.len() == 2 {
                    hash_pair(&pair[0], &pair[1])
                } else {
                    // Odd node: pair with itself
                    hash_pair(&pair[0], &pair[0])
                };
                next.push(parent);
            }
            levels.push(next.clone());
            current = next;
        }

        Ok(Self { levels })
    }

    /// The single digest at the top of the tree. For a one-leaf tree this is
    /// the leaf itself.
    pub fn root(&self) -> Digest {
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves at level 0.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels, including the leaf level and the root level.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Derive the inclusion proof for the leaf at `index`.
    ///
    /// Walks bottom-up: at each level the sibling of an even index is
    /// `index + 1` (side `Right`), of an odd index `index - 1` (side `Left`).
    /// When the even sibling slot is past the end of an odd-length level, the
    /// node itself stands in as its own sibling.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        let leaves = self.leaf_count();
        if index >= leaves {
            return Err(MerkleError::IndexOutOfRange { index, leaves });
        }

        let mut steps = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_idx, side) = if idx % 2 == 0 {
                (idx + 1, Side::Right)
            } else {
                (idx - 1, Side::Left)
            };
            let sibling = if sibling_idx < level.len() {
                level[sibling_idx]
            } else {
                level[idx]
            };
            steps.push(ProofStep {
                sibling_hash: sibling.to_hex(),
                side,
            });
            idx /= 2;
        }

        Ok(MerkleProof { steps })
    }
}

/// Verify that `leaf_hex` is included under `root_hex` via `proof`.
///
/// Recomputes the path bottom-up and compares byte-for-byte against the
/// claimed root. A clean mismatch is `Ok(false)`; malformed hex or a
/// wrong-length digest anywhere in the input is an `Err` so that callers can
/// tell "syntactically invalid proof" apart from "document was tampered with".
pub fn verify_inclusion(
    leaf_hex: &str,
    proof: &MerkleProof,
    root_hex: &str,
) -> Result<bool, MerkleError> {
    let leaf = Digest::from_hex(leaf_hex)?;
    let root = Digest::from_hex(root_hex)?;

    let mut current = leaf;
    for step in &proof.steps {
        let sibling = Digest::from_hex(&step.sibling_hash)?;
        current = match step.side {
            Side::Left => hash_pair(&sibling, &current),
            Side::Right => hash_pair(&current, &sibling),
        };
    }

    Ok(current == root)
}

/// Verify against a proof in its serialized JSON form, as handed to external
/// auditors.
pub fn verify_inclusion_json(
    leaf_hex: &str,
    proof_json: &str,
    root_hex: &str,
) -> Result<bool, MerkleError> {
    let proof = MerkleProof::from_json(proof_json)?;
    verify_inclusion(leaf_hex, &proof, root_hex)
}
