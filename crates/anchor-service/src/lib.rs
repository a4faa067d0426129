//! Document processing pipeline for anchor.
//!
//! [`AuditService`] ties the collaborators together: hash the document
//! bytes, anchor the hash (directly, through the batching layer, or not at
//! all for baseline measurements), upload the bytes to the object store, and
//! save a metadata record in the index. It also hosts the auditor-facing
//! verification flow.

pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::{AnchorMode, AuditService, Verification, BASELINE_TX_ID};
