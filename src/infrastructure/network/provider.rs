// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::{Provider, RootProvider};
use url::Url;

pub type RpcProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<RpcProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        Ok(RootProvider::new_http(url))
    }

    /// WebSocket or IPC endpoint; the transport is picked from the connection string.
    pub async fn connect(endpoint: &str) -> Result<RpcProvider, AppError> {
        RootProvider::connect(endpoint)
            .await
            .map_err(|e| AppError::Connection(format!("RPC connection to {endpoint} failed: {e}")))
    }

    pub async fn dial(endpoint: &str) -> Result<RpcProvider, AppError> {
        let trimmed = endpoint.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::http(trimmed)
        } else {
            Self::connect(trimmed).await
        }
    }

    /// Fails when the endpoint serves a different chain than the session expects.
    pub async fn ensure_chain_id(provider: &RpcProvider, expected: u64) -> Result<(), AppError> {
        let reported = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id lookup failed: {e}")))?;
        if reported != expected {
            return Err(AppError::Config(format!(
                "RPC endpoint serves chain {reported}, configured chain_id is {expected}"
            )));
        }
        Ok(())
    }
}
