// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::data::abi::BlobMint;
use crate::domain::constants::CANDIDATE_QUEUE_CAPACITY;
use crate::domain::session::{SessionConfig, Termination};
use crate::network::provider::RpcProvider;
use crate::services::metrics::{spawn_metrics_server, spawn_monitor};
use crate::services::mining::builder::TransactionBuilder;
use crate::services::mining::candidate::{Candidate, CandidateMiner};
use crate::services::mining::submission::SubmissionController;
use crate::services::mining::target::{TargetTracker, wait_for_target};
use crate::services::mining::worker::{MiningStats, WorkerPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Process-level knobs that are not part of the mining session itself.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub workers: usize,
    pub monitor_interval: Duration,
    pub metrics_port: Option<u16>,
}

pub struct Engine {
    provider: RpcProvider,
    session: Arc<SessionConfig>,
    options: EngineOptions,
    stats: Arc<MiningStats>,
    shutdown: CancellationToken,
}

impl Engine {
    pub fn new(provider: RpcProvider, session: SessionConfig, options: EngineOptions) -> Self {
        Self {
            provider,
            session: Arc::new(session),
            options,
            stats: Arc::new(MiningStats::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Runs target tracking, mining and submission until a terminal condition.
    pub async fn run(self) -> Result<Termination, AppError> {
        let contract = BlobMint::new(self.session.contract, self.provider.clone());

        let tracker = Arc::new(TargetTracker::new());
        let target_rx = tracker.subscribe();
        {
            let tracker = Arc::clone(&tracker);
            let contract = contract.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { tracker.run(contract, shutdown).await });
        }

        let _monitor = spawn_monitor(
            Arc::clone(&self.stats),
            self.options.monitor_interval,
            self.shutdown.clone(),
        );
        if let Some(port) = self.options.metrics_port {
            spawn_metrics_server(port, Arc::clone(&self.stats), target_rx.clone()).await;
        }

        let bootstrap = tokio::select! {
            target = wait_for_target(&target_rx, &self.shutdown) => target,
            _ = operator_abort() => None,
        };
        let Some(target) = bootstrap else {
            self.shutdown.cancel();
            return Ok(Termination::Aborted);
        };
        tracing::info!(target: "engine", threshold = %target, "target ready, start mining");

        let (candidate_tx, mut candidates) = mpsc::channel(CANDIDATE_QUEUE_CAPACITY);
        let miner = Arc::new(CandidateMiner::new(self.session.acceptance_rule));
        let pool = WorkerPool::spawn(
            self.options.workers,
            Arc::clone(&miner),
            target_rx,
            candidate_tx,
            Arc::clone(&self.stats),
            self.shutdown.clone(),
        )?;

        let builder =
            TransactionBuilder::new(self.provider.clone(), Arc::clone(&self.session), miner);
        let mut submission = SubmissionController::new(
            self.provider.clone(),
            contract,
            Arc::clone(&self.session),
            Arc::clone(&self.stats),
        );

        let termination = tokio::select! {
            reason = consume(&mut candidates, &builder, &mut submission) => reason,
            _ = operator_abort() => Termination::Aborted,
        };

        self.shutdown.cancel();
        pool.stop();
        drop(candidates);
        if tokio::task::spawn_blocking(move || pool.join()).await.is_err() {
            tracing::warn!(target: "engine", "worker join task failed");
        }

        tracing::info!(
            target: "engine",
            reason = %termination,
            attempts = self.stats.attempts(),
            accepted = self.stats.accepted(),
            confirmed = self.stats.confirmed(),
            "session finished"
        );
        Ok(termination)
    }
}

/// Sequential consumer: one candidate at a time through build, guard and submission.
async fn consume(
    candidates: &mut mpsc::Receiver<Candidate>,
    builder: &TransactionBuilder,
    submission: &mut SubmissionController,
) -> Termination {
    while let Some(candidate) = candidates.recv().await {
        let versioned_hash = candidate.versioned_hash;
        let tx = match builder.build(candidate).await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!(
                    target: "engine",
                    versioned_hash = %versioned_hash,
                    error = %e,
                    "failed to make tx"
                );
                continue;
            }
        };
        if let Some(reason) = submission.submit(tx).await {
            return reason;
        }
    }
    tracing::warn!(target: "engine", "candidate queue closed");
    Termination::Aborted
}

/// Resolves on Ctrl-C; never resolves if the signal handler cannot be installed.
async fn operator_abort() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "engine", error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "engine", "interrupt received, shutting down");
}
