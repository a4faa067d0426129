//! Object store boundary for anchor.
//!
//! The store persists raw document bytes; the batching layer never touches
//! it. Only the trait boundary is specified here — a production deployment
//! supplies an S3/MinIO-style adapter, while [`MemoryStore`] backs tests and
//! benchmark runs.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::ObjectStore;
