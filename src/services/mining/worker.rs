// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::services::mining::candidate::{Candidate, CandidateMiner};
use alloy::primitives::U256;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Room for a boxed blob, its c-kzg copy and the commitment scratch space.
const WORKER_STACK_BYTES: usize = 8 * 1024 * 1024;

/// Process-wide mining counters. Written by every worker, read by the monitor.
#[derive(Debug, Default)]
pub struct MiningStats {
    attempts: AtomicU64,
    accepted: AtomicU64,
    submitted: AtomicU64,
    confirmed: AtomicU64,
    failed: AtomicU64,
}

impl MiningStats {
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Fixed-size pool of OS threads running [`CandidateMiner::mine_once`] in a tight loop.
///
/// Accepted candidates go through a bounded channel; a full channel blocks the worker.
/// Workers exit when the shutdown token fires or the receiving side is dropped.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    pub fn spawn(
        count: usize,
        miner: Arc<CandidateMiner>,
        target_rx: watch::Receiver<U256>,
        candidate_tx: mpsc::Sender<Candidate>,
        stats: Arc<MiningStats>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        let count = count.max(1);
        let mut handles = Vec::with_capacity(count);
        for id in 0..count {
            let miner = Arc::clone(&miner);
            let target_rx = target_rx.clone();
            let candidate_tx = candidate_tx.clone();
            let stats = Arc::clone(&stats);
            let shutdown = shutdown.clone();
            let handle = thread::Builder::new()
                .name(format!("blob-miner-{id}"))
                .stack_size(WORKER_STACK_BYTES)
                .spawn(move || {
                    worker_loop(id, &miner, &target_rx, &candidate_tx, &stats, &shutdown)
                })
                .map_err(|e| {
                    AppError::Initialization(format!("spawn mining worker {id}: {e}"))
                })?;
            handles.push(handle);
        }
        tracing::info!(target: "miner", workers = count, "create cpu task");
        Ok(Self { handles, shutdown })
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Joins every worker. Blocks; call after [`stop`](Self::stop) and after the
    /// receiver is dropped, otherwise a worker parked on a full queue never returns.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::warn!(target: "miner", "mining worker panicked");
            }
        }
    }
}

fn worker_loop(
    id: usize,
    miner: &CandidateMiner,
    target_rx: &watch::Receiver<U256>,
    candidate_tx: &mpsc::Sender<Candidate>,
    stats: &MiningStats,
    shutdown: &CancellationToken,
) {
    let mut rng = rand::thread_rng();
    while !shutdown.is_cancelled() {
        let target = *target_rx.borrow();
        let outcome = miner.mine_once(&mut rng, target, id);
        stats.record_attempt();

        match outcome {
            Ok(Some(candidate)) => {
                stats.record_accept();
                tracing::info!(
                    target: "miner",
                    worker_id = id,
                    versioned_hash = %candidate.versioned_hash,
                    "mined new blob"
                );
                if candidate_tx.blocking_send(candidate).is_err() {
                    tracing::debug!(target: "miner", worker_id = id, "candidate queue closed");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(target: "miner", worker_id = id, error = %e, "attempt discarded");
            }
        }
    }
    tracing::debug!(target: "miner", worker_id = id, "mining worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::AcceptanceRule;
    use std::time::Duration;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let stats = MiningStats::default();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_accept();
        stats.record_confirmed();
        assert_eq!(stats.attempts(), 2);
        assert_eq!(stats.accepted(), 1);
        assert_eq!(stats.confirmed(), 1);
        assert_eq!(stats.failed(), 0);
    }

    #[test]
    fn zero_target_rejects_and_stops_on_cancel() {
        let (_target_tx, target_rx) = watch::channel(U256::ZERO);
        let (candidate_tx, mut candidate_rx) = mpsc::channel(3);
        let stats = Arc::new(MiningStats::default());
        let shutdown = CancellationToken::new();
        let pool = WorkerPool::spawn(
            2,
            Arc::new(CandidateMiner::new(AcceptanceRule::Truncate)),
            target_rx,
            candidate_tx,
            Arc::clone(&stats),
            shutdown.clone(),
        )
        .expect("spawn");

        while stats.attempts() < 2 {
            thread::sleep(Duration::from_millis(5));
        }
        pool.stop();
        pool.join();

        assert_eq!(stats.accepted(), 0);
        assert!(candidate_rx.try_recv().is_err());
    }
}
