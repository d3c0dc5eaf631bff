// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::data::abi::mint_calldata;
use crate::domain::constants::GAS_LIMIT_MARGIN;
use crate::domain::session::SessionConfig;
use crate::network::gas::BlobFeeOracle;
use crate::network::nonce::NonceManager;
use crate::network::provider::RpcProvider;
use crate::services::mining::candidate::{Candidate, CandidateMiner};
use alloy::consensus::{SignableTransaction, TxEip4844, TxEip4844Variant, TxEip4844WithSidecar};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::eips::eip4844::BlobTransactionSidecar;
use alloy::network::TxSignerSync;
use alloy::primitives::{B256, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy_consensus::TxEnvelope;
use std::sync::Arc;

/// Signed type-3 transaction in network encoding (sidecar included).
#[derive(Clone)]
pub struct SignedBlobTx {
    pub hash: B256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_blob_gas: u128,
    pub versioned_hash: B256,
    pub raw: Vec<u8>,
}

impl std::fmt::Debug for SignedBlobTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedBlobTx")
            .field("hash", &self.hash)
            .field("nonce", &self.nonce)
            .field("gas_limit", &self.gas_limit)
            .field("max_fee_per_blob_gas", &self.max_fee_per_blob_gas)
            .field("versioned_hash", &self.versioned_hash)
            .field("raw_len", &self.raw.len())
            .finish()
    }
}

/// Per-transaction values fetched from the chain right before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobTxParams {
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_blob_gas: u128,
}

pub struct TransactionBuilder {
    provider: RpcProvider,
    session: Arc<SessionConfig>,
    miner: Arc<CandidateMiner>,
    nonces: NonceManager,
    fees: BlobFeeOracle,
}

impl TransactionBuilder {
    pub fn new(
        provider: RpcProvider,
        session: Arc<SessionConfig>,
        miner: Arc<CandidateMiner>,
    ) -> Self {
        let nonces = NonceManager::new(provider.clone(), session.sender);
        let fees = BlobFeeOracle::new(provider.clone(), session.blob_params, session.blob_fee);
        Self {
            provider,
            session,
            miner,
            nonces,
            fees,
        }
    }

    /// Turns one accepted candidate into a signed transaction. Any error discards the candidate.
    pub async fn build(&self, candidate: Candidate) -> Result<SignedBlobTx, AppError> {
        let versioned_hash = candidate.versioned_hash;
        let miner = Arc::clone(&self.miner);
        let sidecar = tokio::task::spawn_blocking(move || blob_sidecar(&miner, candidate))
            .await
            .map_err(|e| AppError::Unknown(anyhow::Error::new(e).context("sidecar task")))??;

        let nonce = self.nonces.get_next_nonce().await?;
        let quote = self.fees.quote().await?;
        let gas_limit = self.estimate_gas(versioned_hash).await?;

        let params = BlobTxParams {
            nonce,
            gas_limit,
            max_fee_per_blob_gas: quote.max_fee_per_blob_gas,
        };
        assemble_and_sign(&self.session, params, sidecar)
    }

    async fn estimate_gas(&self, versioned_hash: B256) -> Result<u64, AppError> {
        let request = TransactionRequest {
            from: Some(self.session.sender),
            to: Some(TxKind::Call(self.session.contract)),
            input: TransactionInput::new(mint_calldata()),
            blob_versioned_hashes: Some(vec![versioned_hash]),
            ..Default::default()
        };
        let estimate = self
            .provider
            .estimate_gas(request)
            .await
            .map_err(|e| AppError::Build(format!("estimate_gas failed: {e}")))?;
        let gas_limit = estimate.saturating_add(GAS_LIMIT_MARGIN);
        tracing::info!(target: "builder", gas = gas_limit, "rpc estimate gas");
        Ok(gas_limit)
    }
}

/// Blob, commitment and freshly computed proof for a single-blob transaction.
pub fn blob_sidecar(
    miner: &CandidateMiner,
    candidate: Candidate,
) -> Result<BlobTransactionSidecar, AppError> {
    let proof = miner.prove(&candidate.blob, &candidate.commitment)?;
    Ok(BlobTransactionSidecar::new(
        vec![*candidate.blob],
        vec![candidate.commitment],
        vec![proof],
    ))
}

/// Builds the EIP-4844 mint transaction and signs it with the session key.
pub fn assemble_and_sign(
    session: &SessionConfig,
    params: BlobTxParams,
    sidecar: BlobTransactionSidecar,
) -> Result<SignedBlobTx, AppError> {
    let blob_versioned_hashes: Vec<B256> = sidecar.versioned_hashes().collect();
    let versioned_hash = blob_versioned_hashes
        .first()
        .copied()
        .ok_or_else(|| AppError::Build("sidecar carries no blobs".into()))?;

    let tx = TxEip4844 {
        chain_id: session.chain_id,
        nonce: params.nonce,
        gas_limit: params.gas_limit,
        max_fee_per_gas: session.max_fee_per_gas,
        max_priority_fee_per_gas: session.max_priority_fee_per_gas,
        to: session.contract,
        value: U256::ZERO,
        access_list: AccessList::default(),
        blob_versioned_hashes,
        max_fee_per_blob_gas: params.max_fee_per_blob_gas,
        input: mint_calldata(),
    };
    let with_sidecar = TxEip4844WithSidecar::from_tx_and_sidecar(tx, sidecar);
    let mut tx = TxEip4844Variant::TxEip4844WithSidecar(with_sidecar);

    let sig = TxSignerSync::sign_transaction_sync(&session.signer, &mut tx)
        .map_err(|e| AppError::Build(format!("Sign tx failed: {}", e)))?;
    let signed: TxEnvelope = tx.into_signed(sig).into();
    let hash = *signed.tx_hash();
    let raw = signed.encoded_2718();

    tracing::debug!(
        target: "builder",
        tx_hash = %hash,
        nonce = params.nonce,
        gas_limit = params.gas_limit,
        max_fee_per_blob_gas = params.max_fee_per_blob_gas,
        raw_len = raw.len(),
        "signed blob transaction"
    );

    Ok(SignedBlobTx {
        hash,
        nonce: params.nonce,
        gas_limit: params.gas_limit,
        max_fee_per_blob_gas: params.max_fee_per_blob_gas,
        versioned_hash,
        raw,
    })
}
