use std::sync::{Arc, RwLock};

use chrono::{SecondsFormat, Utc};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use anchor_crypto::{MerkleTree, LEAF_ALGO, NODE_ALGO};
use anchor_ledger::Ledger;
use anchor_types::{Digest, DIGEST_LEN};

use crate::config::BatcherConfig;
use crate::error::BatchError;
use crate::outcome::{BatchOutcome, BatchTiming};

/// One admitted leaf plus its private completion handle. The flush that
/// seals this leaf's batch writes into `reply` exactly once.
struct Submission {
    leaf: Digest,
    enqueue_ns: i64,
    reply: oneshot::Sender<BatchOutcome>,
}

/// Concurrent batching scheduler.
///
/// Producers call [`add`](Self::add) from any task; a dedicated control loop
/// owns the open batch and is the only code that mutates it. The loop moves
/// through Idle (no open batch, no timer), Accumulating (open batch, armed
/// deadline), and Flushing; a leaf arriving during a flush starts the next
/// batch and never joins the one being sealed.
pub struct MerkleBatcher {
    tx: RwLock<Option<mpsc::Sender<Submission>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    config: BatcherConfig,
}

impl MerkleBatcher {
    /// Start the control loop on the current tokio runtime.
    pub fn spawn(ledger: Arc<dyn Ledger>, config: BatcherConfig) -> Self {
        let config = config.normalized();
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = tokio::spawn(run_loop(rx, ledger, config.clone()));
        info!(
            batch_size = config.batch_size,
            max_wait_ms = config.max_wait.as_millis() as u64,
            "merkle batcher started"
        );
        Self {
            tx: RwLock::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            config,
        }
    }

    /// The normalized configuration the loop is running with.
    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Submit a raw 32-byte leaf digest and wait for its batch to resolve.
    ///
    /// Suspends from admission until the batch containing this leaf is
    /// flushed — that single wait is what amortizes the ledger round trip
    /// across every producer in the batch. The caller cannot observe whether
    /// the flush was size- or deadline-triggered.
    ///
    /// Errors only on malformed input or a closed batcher; a failed ledger
    /// write is reported through [`BatchOutcome::failure`].
    pub async fn add(&self, leaf: &[u8]) -> Result<BatchOutcome, BatchError> {
        if leaf.len() != DIGEST_LEN {
            return Err(BatchError::InvalidLeafLength {
                expected: DIGEST_LEN,
                actual: leaf.len(),
            });
        }
        let mut raw = [0u8; DIGEST_LEN];
        raw.copy_from_slice(leaf);

        let sender = self
            .tx
            .read()
            .expect("batcher lock poisoned")
            .clone()
            .ok_or(BatchError::Closed)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let submission = Submission {
            leaf: Digest::from_hash(raw),
            enqueue_ns: unix_ns(),
            reply: reply_tx,
        };

        // Blocks while the hand-off queue is full.
        sender
            .send(submission)
            .await
            .map_err(|_| BatchError::Closed)?;
        // The loop's final flush fires once every sender clone is gone;
        // holding ours across the wait would stall shutdown until the
        // deadline timer instead.
        drop(sender);

        // Once admitted, an outcome is always delivered; a dropped reply
        // channel means the loop is gone.
        reply_rx.await.map_err(|_| BatchError::Closed)
    }

    /// Graceful shutdown: stop admissions, flush the open partial batch once,
    /// and wait for its outcomes to be delivered. Idempotent — a second call
    /// is a no-op.
    pub async fn close(&self) {
        let sender = self.tx.write().expect("batcher lock poisoned").take();
        drop(sender);

        let worker = self.worker.lock().await.take();
        if let Some(handle) = worker {
            if handle.await.is_err() {
                warn!("batcher loop terminated abnormally");
            }
        }
    }
}

/// Single-owner control loop: reads admissions, races the flush deadline
/// against the size threshold, and seals at most one batch at a time.
async fn run_loop(
    mut rx: mpsc::Receiver<Submission>,
    ledger: Arc<dyn Ledger>,
    config: BatcherConfig,
) {
    let mut batch: Vec<Submission> = Vec::new();
    // Armed when the batch opens, disarmed together with every flush so the
    // losing trigger of the timer/size race is a no-op.
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(submission) => {
                    batch.push(submission);
                    if batch.len() == 1 {
                        deadline = Some(Instant::now() + config.max_wait);
                    }
                    if batch.len() >= config.batch_size {
                        flush(std::mem::take(&mut batch), ledger.as_ref()).await;
                        deadline = None;
                    }
                }
                None => {
                    // All senders dropped: final flush, then stop.
                    flush(std::mem::take(&mut batch), ledger.as_ref()).await;
                    break;
                }
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() =>
            {
                flush(std::mem::take(&mut batch), ledger.as_ref()).await;
                deadline = None;
            }
        }
    }

    debug!("batcher loop stopped");
}

/// Seal a batch: build its tree, commit the root, fan outcomes back out.
/// Either every leaf sees the committed root or every leaf sees the
/// identical failure.
async fn flush(items: Vec<Submission>, ledger: &dyn Ledger) {
    if items.is_empty() {
        return;
    }

    let flush_start_ns = unix_ns();
    let leaves: Vec<Digest> = items.iter().map(|s| s.leaf).collect();

    let build_start_ns = unix_ns();
    let tree = match MerkleTree::build(&leaves) {
        Ok(tree) => tree,
        Err(err) => {
            let build_end_ns = unix_ns();
            warn!(leaves = leaves.len(), error = %err, "merkle build failed");
            deliver_failure(items, None, &err.to_string(), BatchTiming {
                flush_start_ns,
                build_start_ns,
                build_end_ns,
                ..Default::default()
            });
            return;
        }
    };
    let build_end_ns = unix_ns();

    let root = tree.root();
    let root_hex = root.to_hex();
    let metadata = format!(
        "type=merkle_batch; root={root_hex}; leaves={}; leaf_algo={LEAF_ALGO}; node_algo={NODE_ALGO}; created_at={}",
        leaves.len(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
    );

    let ledger_start_ns = unix_ns();
    let written = ledger.write(&root_hex, &metadata).await;
    let ledger_end_ns = unix_ns();

    let shared_timing = BatchTiming {
        enqueue_ns: 0,
        flush_start_ns,
        build_start_ns,
        build_end_ns,
        ledger_start_ns,
        ledger_end_ns,
        response_ns: 0,
    };

    match written {
        Ok(tx_id) => {
            info!(
                root = %root.short_hex(),
                leaves = leaves.len(),
                tx_id = %tx_id,
                "batch committed"
            );
            let batch_size = items.len();
            for (index, submission) in items.into_iter().enumerate() {
                // Index is in range by construction.
                let proof = tree.proof(index).ok();
                let outcome = BatchOutcome {
                    root: Some(root),
                    tx_id: Some(tx_id.clone()),
                    index,
                    batch_size,
                    proof,
                    failure: None,
                    timing: BatchTiming {
                        enqueue_ns: submission.enqueue_ns,
                        response_ns: unix_ns(),
                        ..shared_timing.clone()
                    },
                };
                // A receiver that gave up is its own problem.
                let _ = submission.reply.send(outcome);
            }
        }
        Err(err) => {
            warn!(
                root = %root.short_hex(),
                leaves = leaves.len(),
                error = %err,
                "batch commit failed"
            );
            deliver_failure(items, Some(root), &err.to_string(), shared_timing);
        }
    }
}

/// Hand every waiter of a failed flush the identical error.
fn deliver_failure(
    items: Vec<Submission>,
    root: Option<Digest>,
    failure: &str,
    shared_timing: BatchTiming,
) {
    let batch_size = items.len();
    for (index, submission) in items.into_iter().enumerate() {
        let outcome = BatchOutcome {
            root,
            tx_id: None,
            index,
            batch_size,
            proof: None,
            failure: Some(failure.to_string()),
            timing: BatchTiming {
                enqueue_ns: submission.enqueue_ns,
                response_ns: unix_ns(),
                ..shared_timing.clone()
            },
        };
        let _ = submission.reply.send(outcome);
    }
}

fn unix_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use anchor_crypto::verify_inclusion;
    use anchor_ledger::MockLedger;

    fn leaf(seed: u8) -> [u8; DIGEST_LEN] {
        *Digest::of_bytes(&[seed]).as_bytes()
    }

    fn config(batch_size: usize, max_wait: Duration) -> BatcherConfig {
        BatcherConfig {
            batch_size,
            max_wait,
            queue_capacity: 0,
        }
    }

    async fn add_all(
        batcher: &Arc<MerkleBatcher>,
        seeds: std::ops::Range<u8>,
    ) -> Vec<BatchOutcome> {
        let mut handles = Vec::new();
        for seed in seeds {
            let batcher = Arc::clone(batcher);
            handles.push(tokio::spawn(async move {
                batcher.add(&leaf(seed)).await.expect("add failed")
            }));
        }
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.expect("task panicked"));
        }
        outcomes
    }

    #[tokio::test]
    async fn flush_by_size_is_one_ledger_write() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(4, Duration::from_secs(60)),
        ));

        let outcomes = add_all(&batcher, 0..4).await;

        assert_eq!(ledger.write_count(), 1);
        assert_eq!(outcomes.len(), 4);

        let root = outcomes[0].root.expect("root missing");
        let tx_id = outcomes[0].tx_id.clone().expect("tx id missing");
        let mut indices = HashSet::new();
        for outcome in &outcomes {
            assert!(outcome.is_committed());
            assert_eq!(outcome.root, Some(root));
            assert_eq!(outcome.tx_id.as_deref(), Some(tx_id.as_str()));
            assert_eq!(outcome.batch_size, 4);
            indices.insert(outcome.index);
        }
        assert_eq!(indices, (0..4usize).collect::<HashSet<_>>());

        batcher.close().await;
    }

    #[tokio::test]
    async fn every_outcome_carries_a_verifying_proof() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(5, Duration::from_secs(60)),
        ));

        let mut handles = Vec::new();
        for seed in 0..5u8 {
            let batcher = Arc::clone(&batcher);
            handles.push(tokio::spawn(async move {
                let outcome = batcher.add(&leaf(seed)).await.unwrap();
                (Digest::from_hash(leaf(seed)), outcome)
            }));
        }
        for handle in handles {
            let (submitted, outcome) = handle.await.unwrap();
            let root = outcome.root.unwrap();
            let proof = outcome.proof.expect("proof missing");
            assert!(
                verify_inclusion(&submitted.to_hex(), &proof, &root.to_hex()).unwrap(),
                "proof for index {} did not verify",
                outcome.index
            );
        }

        batcher.close().await;
    }

    #[tokio::test]
    async fn flush_by_timeout_does_not_block() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = MerkleBatcher::spawn(ledger.clone(), config(100, Duration::from_millis(20)));

        let outcome = tokio::time::timeout(Duration::from_secs(2), batcher.add(&leaf(7)))
            .await
            .expect("add blocked past the flush deadline")
            .unwrap();

        assert!(outcome.is_committed());
        assert_eq!(outcome.batch_size, 1);
        assert_eq!(outcome.index, 0);
        // A one-leaf tree has an empty proof and the leaf as its root.
        assert_eq!(outcome.root, Some(Digest::from_hash(leaf(7))));
        assert!(outcome.proof.unwrap().is_empty());
        assert_eq!(ledger.write_count(), 1);

        batcher.close().await;
    }

    #[tokio::test]
    async fn ledger_failure_is_shared_by_the_whole_batch() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_next_writes(1);
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(2, Duration::from_secs(60)),
        ));

        let failed = add_all(&batcher, 0..2).await;
        assert_eq!(ledger.write_count(), 0);
        let reason = failed[0].failure.clone().expect("failure missing");
        for outcome in &failed {
            assert!(!outcome.is_committed());
            assert_eq!(outcome.failure.as_deref(), Some(reason.as_str()));
            assert!(outcome.tx_id.is_none());
            assert!(outcome.proof.is_none());
            assert_eq!(outcome.batch_size, 2);
            // Timing still populated for observability.
            assert!(outcome.timing.ledger_end_ns >= outcome.timing.ledger_start_ns);
            assert!(outcome.timing.response_ns > 0);
        }

        // The scheduler stays usable for the next batch.
        let recovered = add_all(&batcher, 2..4).await;
        assert!(recovered.iter().all(|o| o.is_committed()));
        assert_eq!(ledger.write_count(), 1);

        batcher.close().await;
    }

    #[tokio::test]
    async fn batch_size_one_degenerates_to_per_leaf_writes() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = MerkleBatcher::spawn(ledger.clone(), config(1, Duration::from_secs(60)));

        let first = batcher.add(&leaf(1)).await.unwrap();
        let second = batcher.add(&leaf(2)).await.unwrap();

        assert_eq!(ledger.write_count(), 2);
        assert_eq!(first.index, 0);
        assert_eq!(second.index, 0);
        assert_ne!(first.root, second.root);

        batcher.close().await;
    }

    #[tokio::test]
    async fn close_flushes_the_open_partial_batch() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(100, Duration::from_secs(60)),
        ));

        let pending = tokio::spawn({
            let batcher = Arc::clone(&batcher);
            async move { batcher.add(&leaf(9)).await.unwrap() }
        });
        // Let the submission reach the control loop before closing.
        tokio::time::sleep(Duration::from_millis(10)).await;

        batcher.close().await;

        let outcome = pending.await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.batch_size, 1);
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn close_does_not_wait_out_the_flush_deadline() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(100, Duration::from_secs(60)),
        ));

        let pending = tokio::spawn({
            let batcher = Arc::clone(&batcher);
            async move { batcher.add(&leaf(3)).await.unwrap() }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The final flush must come from shutdown, not from the 60s timer.
        tokio::time::timeout(Duration::from_secs(2), batcher.close())
            .await
            .expect("close blocked on the deadline timer");

        let outcome = pending.await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn add_after_close_fails_fast() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = MerkleBatcher::spawn(ledger, config(4, Duration::from_millis(20)));

        batcher.close().await;
        assert_eq!(batcher.add(&leaf(1)).await.unwrap_err(), BatchError::Closed);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = MerkleBatcher::spawn(ledger.clone(), config(4, Duration::from_millis(20)));

        batcher.add(&leaf(1)).await.unwrap();
        batcher.close().await;
        batcher.close().await;
        // Exactly one flush happened: the timeout flush of the single leaf.
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn wrong_leaf_length_is_rejected_before_admission() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = MerkleBatcher::spawn(ledger.clone(), config(1, Duration::from_millis(20)));

        let err = batcher.add(&[0u8; 16]).await.unwrap_err();
        assert_eq!(
            err,
            BatchError::InvalidLeafLength {
                expected: 32,
                actual: 16
            }
        );
        batcher.close().await;
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn committed_metadata_is_readable_from_the_ledger() {
        let ledger = Arc::new(MockLedger::new());
        let batcher = Arc::new(MerkleBatcher::spawn(
            ledger.clone(),
            config(3, Duration::from_secs(60)),
        ));

        let outcomes = add_all(&batcher, 0..3).await;
        let root = outcomes[0].root.unwrap();

        let metadata = ledger.read(&root.to_hex()).await.unwrap();
        assert!(metadata.contains("type=merkle_batch"));
        assert!(metadata.contains(&format!("root={}", root.to_hex())));
        assert!(metadata.contains("leaves=3"));
        assert!(metadata.contains("leaf_algo=sha256(file_bytes)"));
        assert!(metadata.contains("node_algo=sha256(l||r)"));

        batcher.close().await;
    }
}
