// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use std::time::Duration;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const DEFAULT_RPC_URL: &str = "https://1rpc.io/eth";

/// Mint contract on Ethereum mainnet.
pub const MINT_CONTRACT_MAINNET: Address = address!("3F97a968B848c711373B7Fbedb077041c9Ace145");

// =============================================================================
// MINT CONTRACT LIMITS
// =============================================================================

/// Per-address mint limit enforced by the contract.
pub const PER_ADDRESS_LIMIT: u64 = 5;
/// Highest token id the contract will ever mint.
pub const TOTAL_SUPPLY: u64 = 4844;

// =============================================================================
// BLOB / MINING CONSTANTS
// =============================================================================

/// Random bytes drawn per candidate (126 KiB).
pub const PAYLOAD_BYTES: usize = 126 * 1024;
/// Usable bytes per field element before the nibble tail.
pub const FIELD_ELEMENT_BODY_BYTES: usize = 31;
/// Accepted candidates waiting for the submission loop.
pub const CANDIDATE_QUEUE_CAPACITY: usize = 3;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

/// Added on top of `eth_estimateGas` for the mint call.
pub const GAS_LIMIT_MARGIN: u64 = 20_000;
pub const DEFAULT_TIP_CAP_GWEI: &str = "0.01";
pub const DEFAULT_BLOB_FEE_MULTIPLIER: u64 = 2;
pub const DEFAULT_BLOB_FEE_FLOOR_GWEI: &str = "20";
/// Blob gas schedule active on mainnet.
pub const DEFAULT_BLOB_SCHEDULE: &str = "bpo2";

// =============================================================================
// TIMING
// =============================================================================

pub const TARGET_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const TARGET_BOOTSTRAP_INTERVAL: Duration = Duration::from_secs(1);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 20;

/// Default mining pool size: all cores but one, never zero.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
