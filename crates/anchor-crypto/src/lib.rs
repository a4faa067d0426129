//! Merkle tree construction and inclusion proofs for anchor.
//!
//! A batch of 32-byte leaf digests is folded into a binary hash tree whose
//! single root is what actually gets written to the ledger. Each leaf gets a
//! sibling-path [`MerkleProof`] that, together with the leaf and the claimed
//! root, verifies inclusion with no ledger access at all.
//!
//! All hashing is plain SHA-256 — no custom cryptography.

pub mod error;
pub mod hasher;
pub mod merkle;

pub use error::MerkleError;
pub use hasher::{hash_pair, LEAF_ALGO, NODE_ALGO};
pub use merkle::{verify_inclusion, verify_inclusion_json, MerkleProof, MerkleTree, ProofStep, Side};
