use anchor_types::TypeError;
use thiserror::Error;

/// Errors produced by Merkle construction, proof derivation, and
/// proof decoding.
///
/// A proof that decodes cleanly but recomputes to a different root is not an
/// error: verification reports that as a plain `false`. Only malformed input
/// surfaces here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a tree from zero leaves")]
    EmptyLeaves,

    #[error("leaf index {index} out of range for {leaves} leaves")]
    IndexOutOfRange { index: usize, leaves: usize },

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid proof encoding: {0}")]
    InvalidProofEncoding(String),
}

impl From<TypeError> for MerkleError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidHex(msg) => Self::InvalidHex(msg),
            TypeError::InvalidLength { expected, actual } => {
                Self::InvalidLength { expected, actual }
            }
        }
    }
}
