use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::Colorize;
use rand::RngCore;
use tracing::warn;

use anchor_batch::{BatcherConfig, MerkleBatcher};
use anchor_index::MemoryIndex;
use anchor_ledger::MockLedger;
use anchor_service::{AnchorMode, AuditService};
use anchor_store::MemoryStore;

use crate::cli::{Args, Mode};

struct RequestRow {
    id: usize,
    duration_sec: f64,
    status: &'static str,
    merkle_wait_sec: f64,
    merkle_batch_size: usize,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let workers = args.workers.max(1);
    println!(
        "Starting experiment: mode={} workers={} documents={} payload={}B",
        args.mode.label().yellow(),
        workers.to_string().bold(),
        args.count.to_string().bold(),
        args.payload_size,
    );

    let ledger = Arc::new(MockLedger::with_delay(Duration::from_millis(
        args.ledger_delay_ms,
    )));
    let store = Arc::new(MemoryStore::new("audit-logs"));
    let index = Arc::new(MemoryIndex::new());

    let mut service = AuditService::new(store, ledger.clone(), index);
    let batcher = match args.mode {
        Mode::Batched => {
            let batcher = Arc::new(MerkleBatcher::spawn(
                ledger.clone(),
                BatcherConfig {
                    batch_size: args.batch_size,
                    max_wait: Duration::from_millis(args.max_wait_ms),
                    queue_capacity: 0,
                },
            ));
            service = service.with_batcher(batcher.clone());
            Some(batcher)
        }
        _ => None,
    };
    let service = Arc::new(service);

    let next_job = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let service = Arc::clone(&service);
        let next_job = Arc::clone(&next_job);
        let count = args.count;
        let payload_size = args.payload_size;
        let mode: AnchorMode = args.mode.into();
        let mode_label = args.mode.label();

        handles.push(tokio::spawn(async move {
            let mut rows = Vec::new();
            loop {
                let job = next_job.fetch_add(1, Ordering::Relaxed);
                if job >= count {
                    break;
                }
                let payload = make_payload(payload_size);
                let filename = format!("req_{mode_label}_{job}.bin");

                let t0 = Instant::now();
                match service.process_document(&filename, &payload, mode).await {
                    Ok((_, metrics)) => rows.push(RequestRow {
                        id: job,
                        duration_sec: t0.elapsed().as_secs_f64(),
                        status: "OK",
                        merkle_wait_sec: metrics.merkle_wait_sec(),
                        merkle_batch_size: metrics.merkle_batch_size,
                    }),
                    Err(err) => {
                        warn!(job, error = %err, "request failed");
                        rows.push(RequestRow {
                            id: job,
                            duration_sec: t0.elapsed().as_secs_f64(),
                            status: "ERR",
                            merkle_wait_sec: 0.0,
                            merkle_batch_size: 0,
                        });
                    }
                }
            }
            rows
        }));
    }

    let mut rows = Vec::with_capacity(args.count);
    for handle in handles {
        rows.extend(handle.await.context("worker task panicked")?);
    }
    if let Some(batcher) = batcher {
        batcher.close().await;
    }
    let total = started.elapsed();

    rows.sort_by_key(|row| row.id);
    let path = args.out.unwrap_or_else(|| {
        format!(
            "results_{}_w{}_c{}.csv",
            args.mode.label(),
            workers,
            args.count
        )
    });
    write_csv(&path, &rows)?;

    let ok = rows.iter().filter(|row| row.status == "OK").count();
    let failed = rows.len() - ok;
    println!(
        "{} {} documents in {:.2}s ({:.2} docs/sec), {} failed",
        "✓".green().bold(),
        ok,
        total.as_secs_f64(),
        args.count as f64 / total.as_secs_f64().max(f64::EPSILON),
        failed,
    );
    println!(
        "Ledger writes: {}",
        ledger.write_count().to_string().bold()
    );
    println!("Results saved to {}", path.as_str().bold());
    Ok(())
}

/// 1 MiB-ish payload with a random header so every document hashes
/// differently without paying for full random generation.
fn make_payload(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size.max(1)];
    let head = data.len().min(1024);
    rand::thread_rng().fill_bytes(&mut data[..head]);
    data
}

fn write_csv(path: &str, rows: &[RequestRow]) -> anyhow::Result<()> {
    let mut file =
        std::fs::File::create(path).with_context(|| format!("cannot create {path}"))?;
    writeln!(
        file,
        "request_id,duration_sec,status,merkle_wait_sec,merkle_batch_size"
    )?;
    for row in rows {
        writeln!(
            file,
            "{},{:.6},{},{:.6},{}",
            row.id, row.duration_sec, row.status, row.merkle_wait_sec, row.merkle_batch_size
        )?;
    }
    Ok(())
}
