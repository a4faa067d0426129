//! Document metadata index boundary for anchor.
//!
//! The index keeps one [`Document`](anchor_types::Document) record per
//! processed file so auditors can look documents up by id later. A relational
//! backend fills this role in production; [`MemoryIndex`] backs tests and
//! benchmark runs.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::IndexError;
pub use memory::MemoryIndex;
pub use traits::DocumentIndex;
