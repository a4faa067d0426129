use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest as _, Sha256};
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::Ledger;

/// In-memory ledger for tests, local demos, and benchmark runs.
///
/// Simulates the one property of a real consensus log that matters to the
/// batching layer: writes are slow. The delay is configurable (a Fabric
/// test network commits in the hundreds of milliseconds). Failures can be
/// scripted with [`fail_next_writes`](Self::fail_next_writes) to exercise
/// the all-or-nothing flush path.
pub struct MockLedger {
    write_delay: Duration,
    committed: RwLock<HashMap<String, String>>,
    writes: AtomicU64,
    fail_writes: AtomicU64,
}

impl MockLedger {
    /// Mock with no artificial latency.
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Mock whose every write sleeps for `write_delay` first.
    pub fn with_delay(write_delay: Duration) -> Self {
        Self {
            write_delay,
            committed: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
            fail_writes: AtomicU64::new(0),
        }
    }

    /// Make the next `n` writes fail with `WriteRejected`.
    pub fn fail_next_writes(&self, n: u64) {
        self.fail_writes.store(n, Ordering::Release);
    }

    /// Total number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn write(&self, digest_hex: &str, metadata: &str) -> Result<String, LedgerError> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        let should_fail = self
            .fail_writes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(LedgerError::WriteRejected("injected failure".into()));
        }

        self.committed
            .write()
            .expect("ledger lock poisoned")
            .insert(digest_hex.to_string(), metadata.to_string());
        self.writes.fetch_add(1, Ordering::AcqRel);

        let mut hasher = Sha256::new();
        hasher.update(digest_hex.as_bytes());
        hasher.update(rand::thread_rng().gen::<u64>().to_le_bytes());
        let tx_id = format!("0x{}", hex::encode(hasher.finalize()));

        debug!(digest = digest_hex, tx_id = %tx_id, "mock ledger write");
        Ok(tx_id)
    }

    async fn read(&self, digest_hex: &str) -> Result<String, LedgerError> {
        self.committed
            .read()
            .expect("ledger lock poisoned")
            .get(digest_hex)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_back() {
        let ledger = MockLedger::new();
        let tx = ledger.write("aa11", "type=test").await.unwrap();
        assert!(tx.starts_with("0x"));
        assert_eq!(tx.len(), 2 + 64);
        assert_eq!(ledger.read("aa11").await.unwrap(), "type=test");
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn read_unknown_digest_is_not_found() {
        let ledger = MockLedger::new();
        assert_eq!(ledger.read("dead").await.unwrap_err(), LedgerError::NotFound);
    }

    #[tokio::test]
    async fn scripted_failures_then_recovery() {
        let ledger = MockLedger::new();
        ledger.fail_next_writes(2);
        assert!(matches!(
            ledger.write("a", "m").await.unwrap_err(),
            LedgerError::WriteRejected(_)
        ));
        assert!(matches!(
            ledger.write("b", "m").await.unwrap_err(),
            LedgerError::WriteRejected(_)
        ));
        // Third write goes through.
        ledger.write("c", "m").await.unwrap();
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn tx_ids_are_unique_per_write() {
        let ledger = MockLedger::new();
        let tx1 = ledger.write("same", "m").await.unwrap();
        let tx2 = ledger.write("same", "m").await.unwrap();
        assert_ne!(tx1, tx2);
    }

    #[tokio::test]
    async fn write_delay_is_applied() {
        let ledger = MockLedger::with_delay(Duration::from_millis(30));
        let before = std::time::Instant::now();
        ledger.write("slow", "m").await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(30));
    }
}
