// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::domain::session::BlobFeePolicy;
use crate::network::provider::RpcProvider;
use alloy::eips::eip7840::BlobParams;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use std::time::Duration;

/// Blob fee parameters for the next block, derived from the latest header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobFeeQuote {
    pub parent_number: u64,
    pub excess_blob_gas: u64,
    /// Wei per blob gas.
    pub blob_base_fee: u128,
    /// Wei per blob gas, after the session policy.
    pub max_fee_per_blob_gas: u128,
}

/// Blob gas counters of the latest block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentBlobGas {
    pub number: u64,
    pub excess_blob_gas: u64,
    pub blob_gas_used: u64,
    /// Execution base fee; feeds the blob reserve price from Osaka on.
    pub base_fee_per_gas: u64,
}

#[derive(Clone)]
pub struct BlobFeeOracle {
    provider: RpcProvider,
    params: BlobParams,
    policy: BlobFeePolicy,
}

impl BlobFeeOracle {
    pub fn new(provider: RpcProvider, params: BlobParams, policy: BlobFeePolicy) -> Self {
        Self {
            provider,
            params,
            policy,
        }
    }

    pub async fn quote(&self) -> Result<BlobFeeQuote, AppError> {
        let provider = self.provider.clone();
        let block = retry_async(
            "latest_header",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_block_by_number(BlockNumberOrTag::Latest).await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Latest block fetch failed: {}", e)))?
        .ok_or_else(|| AppError::Build("RPC returned no latest block".into()))?;

        let header = &block.header;
        let (Some(excess), Some(used), Some(base_fee)) = (
            header.excess_blob_gas,
            header.blob_gas_used,
            header.base_fee_per_gas,
        ) else {
            return Err(AppError::Build(format!(
                "block {} carries no blob gas fields",
                header.number
            )));
        };
        let parent = ParentBlobGas {
            number: header.number,
            excess_blob_gas: excess,
            blob_gas_used: used,
            base_fee_per_gas: base_fee,
        };

        let quote = quote_from_parent(&self.params, &self.policy, parent);
        tracing::info!(
            target: "builder",
            height = quote.parent_number,
            excess_blob_gas = quote.excess_blob_gas,
            blob_base_fee = quote.blob_base_fee,
            max_fee_per_blob_gas = quote.max_fee_per_blob_gas,
            "calc max blob fee cap"
        );
        Ok(quote)
    }
}

/// Excess blob gas of the block built on top of `parent`, reserve price included.
pub fn next_excess_blob_gas(params: &BlobParams, parent: ParentBlobGas) -> u64 {
    params.next_block_excess_blob_gas_osaka(
        parent.excess_blob_gas,
        parent.blob_gas_used,
        parent.base_fee_per_gas,
    )
}

pub fn quote_from_parent(
    params: &BlobParams,
    policy: &BlobFeePolicy,
    parent: ParentBlobGas,
) -> BlobFeeQuote {
    let excess_blob_gas = next_excess_blob_gas(params, parent);
    let blob_base_fee = params.calc_blob_fee(excess_blob_gas);
    BlobFeeQuote {
        parent_number: parent.number,
        excess_blob_gas,
        blob_base_fee,
        max_fee_per_blob_gas: policy.apply(blob_base_fee),
    }
}

/// Node-suggested legacy gas price in wei; default for the session fee cap.
pub async fn suggested_gas_price(provider: &RpcProvider) -> Result<u128, AppError> {
    provider
        .get_gas_price()
        .await
        .map_err(|e| AppError::Connection(format!("eth_gasPrice failed: {}", e)))
}
