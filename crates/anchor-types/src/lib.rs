//! Foundation types for anchor.
//!
//! This crate provides the types shared by every other anchor crate:
//!
//! - [`Digest`] — a fixed 32-byte SHA-256 content digest
//! - [`Document`] — the metadata record kept for each anchored document
//! - [`DocumentMetrics`] — flat per-request timing breakdown for experiments

pub mod digest;
pub mod document;
pub mod error;
pub mod metrics;

pub use digest::{Digest, DIGEST_LEN};
pub use document::Document;
pub use error::TypeError;
pub use metrics::DocumentMetrics;
