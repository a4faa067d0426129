//! Ledger boundary for anchor.
//!
//! The ledger is the slow, append-only, consensus-backed store that anchors
//! batch roots. This crate only specifies the contract the batching layer
//! needs — one write and one read per digest — plus [`MockLedger`], an
//! in-memory stand-in with configurable latency and scripted failures for
//! tests and benchmarks. Real deployments supply their own adapter (e.g. a
//! Fabric gateway) behind the same trait.

pub mod error;
pub mod mock;
pub mod traits;

pub use error::LedgerError;
pub use mock::MockLedger;
pub use traits::Ledger;
