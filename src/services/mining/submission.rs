// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::data::abi::BlobMint::BlobMintInstance;
use crate::domain::constants::RECEIPT_POLL_INTERVAL;
use crate::domain::session::{MintLimits, SessionConfig, Termination};
use crate::network::provider::RpcProvider;
use crate::services::mining::builder::SignedBlobTx;
use crate::services::mining::worker::MiningStats;
use alloy::primitives::{B256, U256};
use alloy::providers::Provider;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Confirmed mints in this session, compared against the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintCounter {
    confirmed: u64,
    max: u64,
}

impl MintCounter {
    pub fn new(max: u64) -> Self {
        Self { confirmed: 0, max }
    }

    pub fn confirmed(&self) -> u64 {
        self.confirmed
    }

    /// Counts one confirmation; `Some` exactly when the maximum is hit.
    pub fn record_confirmation(&mut self) -> Option<Termination> {
        self.confirmed += 1;
        (self.confirmed == self.max).then_some(Termination::MintCapReached {
            minted: self.confirmed,
        })
    }
}

/// Where a single submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Confirmed { hash: B256, success: bool },
    /// Broadcast or receipt lookup failed; on-chain fate unknown.
    Abandoned,
    /// Dry-run: built and checked, never broadcast.
    Skipped,
    Blocked(Termination),
}

/// Guard verdict for the sender's minted count. Query failures never block.
pub fn minted_verdict<E: Display>(
    limits: &MintLimits,
    queried: Result<U256, E>,
) -> Option<Termination> {
    match queried {
        Ok(minted) => {
            tracing::info!(
                target: "submit",
                minted = %minted,
                limit = limits.per_address,
                "user minted"
            );
            limits.check_minted(minted)
        }
        Err(e) => {
            tracing::warn!(target: "submit", error = %e, "failed to get user minted");
            None
        }
    }
}

/// Guard verdict for the next token id. Query failures never block.
pub fn next_token_verdict<E: Display>(
    limits: &MintLimits,
    queried: Result<U256, E>,
) -> Option<Termination> {
    match queried {
        Ok(next) => {
            tracing::info!(
                target: "submit",
                next_token_id = %next,
                supply = limits.total_supply,
                "next token id"
            );
            limits.check_next_token(next)
        }
        Err(e) => {
            tracing::warn!(target: "submit", error = %e, "failed to get next token id");
            None
        }
    }
}

pub struct SubmissionController {
    provider: RpcProvider,
    contract: BlobMintInstance<RpcProvider>,
    session: Arc<SessionConfig>,
    stats: Arc<MiningStats>,
    counter: MintCounter,
    receipt_interval: Duration,
}

impl SubmissionController {
    pub fn new(
        provider: RpcProvider,
        contract: BlobMintInstance<RpcProvider>,
        session: Arc<SessionConfig>,
        stats: Arc<MiningStats>,
    ) -> Self {
        let counter = MintCounter::new(session.max_mints);
        Self {
            provider,
            contract,
            session,
            stats,
            counter,
            receipt_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    /// Overrides the receipt polling cadence.
    pub fn with_receipt_interval(mut self, interval: Duration) -> Self {
        self.receipt_interval = interval;
        self
    }

    pub fn counter(&self) -> &MintCounter {
        &self.counter
    }

    /// Eligibility guard, broadcast, confirmation wait. Returns `Some` when the session must end.
    pub async fn submit(&mut self, tx: SignedBlobTx) -> Option<Termination> {
        match self.process(tx).await {
            SubmissionOutcome::Blocked(reason) => Some(reason),
            SubmissionOutcome::Confirmed { hash, success } => {
                self.stats.record_confirmed();
                if !success {
                    tracing::warn!(
                        target: "submit",
                        tx_hash = %hash,
                        "tx confirmed with failed status"
                    );
                }
                let done = self.counter.record_confirmation();
                tracing::info!(
                    target: "submit",
                    tx_hash = %hash,
                    confirmed = self.counter.confirmed(),
                    max = self.session.max_mints,
                    "tx confirmed"
                );
                done
            }
            SubmissionOutcome::Abandoned => {
                self.stats.record_failed();
                None
            }
            SubmissionOutcome::Skipped => None,
        }
    }

    async fn process(&self, tx: SignedBlobTx) -> SubmissionOutcome {
        if let Some(reason) = self.check_eligibility().await {
            tracing::info!(target: "submit", reason = %reason, "mint limit reached");
            return SubmissionOutcome::Blocked(reason);
        }

        if self.session.dry_run {
            tracing::info!(
                target: "submit",
                tx_hash = %tx.hash,
                nonce = tx.nonce,
                raw_len = tx.raw.len(),
                raw_prefix = %hex::encode(&tx.raw[..tx.raw.len().min(64)]),
                "dry run: transaction not broadcast"
            );
            return SubmissionOutcome::Skipped;
        }

        if let Err(e) = self.provider.send_raw_transaction(&tx.raw).await {
            tracing::error!(target: "submit", tx_hash = %tx.hash, error = %e, "failed to send tx");
            return SubmissionOutcome::Abandoned;
        }
        self.stats.record_submitted();
        tracing::info!(target: "submit", tx_hash = %tx.hash, "tx sent");

        self.await_receipt(tx.hash).await
    }

    async fn check_eligibility(&self) -> Option<Termination> {
        let limits = self.session.limits;
        let minted = self.contract.userMinted(self.session.sender).call().await;
        if let Some(reason) = minted_verdict(&limits, minted) {
            return Some(reason);
        }
        let next = self.contract.nextTokenId().call().await;
        next_token_verdict(&limits, next)
    }

    async fn await_receipt(&self, hash: B256) -> SubmissionOutcome {
        tracing::info!(target: "submit", tx_hash = %hash, "wait for transaction confirmation");
        loop {
            tokio::time::sleep(self.receipt_interval).await;
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    tracing::debug!(
                        target: "submit",
                        tx_hash = %hash,
                        block = ?receipt.block_number,
                        gas_used = receipt.gas_used,
                        "receipt found"
                    );
                    return SubmissionOutcome::Confirmed {
                        hash,
                        success: receipt.status(),
                    };
                }
                Ok(None) => {
                    tracing::info!(
                        target: "submit",
                        tx_hash = %hash,
                        "wait for transaction confirmation"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        target: "submit",
                        tx_hash = %hash,
                        error = %e,
                        "failed to get receipt"
                    );
                    return SubmissionOutcome::Abandoned;
                }
            }
        }
    }
}
