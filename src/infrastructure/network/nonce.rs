// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::RpcProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::time::Duration;

/// Nonce lookups for the session sender. Only one transaction is ever in flight,
/// so the confirmed (`latest`) count is always the next nonce to use.
#[derive(Clone)]
pub struct NonceManager {
    provider: RpcProvider,
    address: Address,
}

impl NonceManager {
    pub fn new(provider: RpcProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub async fn get_next_nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        let nonce = retry_async(
            "nonce",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).latest().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))?;

        tracing::info!(target: "builder", nonce, address = %address, "rpc get nonce");
        Ok(nonce)
    }
}
