// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::data::abi::BlobMint::BlobMintInstance;
use crate::domain::constants::{TARGET_BOOTSTRAP_INTERVAL, TARGET_POLL_INTERVAL};
use crate::network::provider::RpcProvider;
use alloy::primitives::U256;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Single writer of the on-chain acceptance threshold. Readers hold a `watch::Receiver`
/// and may observe a stale (lower) value between polls.
pub struct TargetTracker {
    tx: watch::Sender<U256>,
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(U256::ZERO);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<U256> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> U256 {
        *self.tx.borrow()
    }

    /// Publishes `observed` only if it is strictly above the current target.
    pub fn advance(&self, observed: U256) -> bool {
        self.tx.send_if_modified(|current| {
            if observed > *current {
                *current = observed;
                true
            } else {
                false
            }
        })
    }

    /// Applies one poll result. Errors leave the target untouched.
    pub fn apply_poll<E: Display>(&self, result: Result<U256, E>) -> bool {
        match result {
            Ok(observed) => {
                let updated = self.advance(observed);
                if updated {
                    tracing::info!(target: "target", threshold = %observed, "update target");
                }
                updated
            }
            Err(e) => {
                tracing::warn!(target: "target", error = %e, "failed to get target");
                false
            }
        }
    }

    /// Polls `target()` forever; every tick is independent and failures are only logged.
    pub async fn run(&self, contract: BlobMintInstance<RpcProvider>, shutdown: CancellationToken) {
        loop {
            let polled = contract.target().call().await;
            self.apply_poll(polled);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(TARGET_POLL_INTERVAL) => {}
            }
        }
        tracing::debug!(target: "target", "target tracker stopped");
    }
}

/// Blocks until the first positive target is visible. `None` when shut down first.
pub async fn wait_for_target(
    rx: &watch::Receiver<U256>,
    shutdown: &CancellationToken,
) -> Option<U256> {
    wait_for_target_every(rx, shutdown, TARGET_BOOTSTRAP_INTERVAL).await
}

pub async fn wait_for_target_every(
    rx: &watch::Receiver<U256>,
    shutdown: &CancellationToken,
    interval: Duration,
) -> Option<U256> {
    loop {
        let current = *rx.borrow();
        if current > U256::ZERO {
            return Some(current);
        }
        tracing::info!(target: "target", "waiting for target");
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
