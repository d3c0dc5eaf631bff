// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use alloy::eips::eip7840::BlobParams;
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;

/// Immutable per-process mining session. Built once at startup, shared by reference.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub signer: PrivateKeySigner,
    pub sender: Address,
    pub chain_id: u64,
    pub contract: Address,
    /// Wei per gas.
    pub max_fee_per_gas: u128,
    /// Wei per gas.
    pub max_priority_fee_per_gas: u128,
    pub blob_fee: BlobFeePolicy,
    pub blob_params: BlobParams,
    pub acceptance_rule: AcceptanceRule,
    pub limits: MintLimits,
    /// Confirmed mints after which the session ends.
    pub max_mints: u64,
    pub dry_run: bool,
}

/// Blob gas parameters for a fork name. BPO forks only change counts and the update fraction.
pub fn parse_blob_schedule(raw: &str) -> Result<BlobParams, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cancun" | "dencun" => Ok(BlobParams::cancun()),
        "prague" | "pectra" => Ok(BlobParams::prague()),
        "osaka" | "fusaka" => Ok(BlobParams::osaka()),
        "bpo1" => Ok(BlobParams::bpo1()),
        "bpo2" => Ok(BlobParams::bpo2()),
        other => Err(AppError::validation(
            "blob_schedule",
            format!("unknown schedule `{other}` (expected cancun, prague, osaka, bpo1 or bpo2)"),
        )),
    }
}

/// How the blob-fee-cap attached to each transaction is derived from the current base blob fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobFeePolicy {
    pub multiplier: u128,
    /// Wei per blob gas.
    pub floor: u128,
    /// Wei per blob gas; user authority, wins over the floor.
    pub ceiling: Option<u128>,
}

impl BlobFeePolicy {
    pub fn apply(&self, base_fee: u128) -> u128 {
        let cap = base_fee.saturating_mul(self.multiplier).max(self.floor);
        match self.ceiling {
            Some(ceiling) => cap.min(ceiling),
            None => cap,
        }
    }
}

/// Mapping from a blob's versioned hash to its acceptance integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AcceptanceRule {
    /// Drop the version byte; the remaining 31 bytes form the integer.
    #[default]
    Truncate,
    /// Historical in-place shift: bytes 1..32 followed by a copy of the last byte.
    LegacyShift,
}

impl FromStr for AcceptanceRule {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(AcceptanceRule::Truncate),
            "legacy_shift" | "legacy-shift" | "shift" => Ok(AcceptanceRule::LegacyShift),
            other => Err(AppError::validation(
                "acceptance_rule",
                format!("unknown rule `{other}` (expected truncate or legacy_shift)"),
            )),
        }
    }
}

/// Contract-enforced limits checked right before every broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintLimits {
    pub per_address: u64,
    pub total_supply: u64,
}

impl MintLimits {
    /// `Some` when the sender has already used up its allowance.
    pub fn check_minted(&self, minted: U256) -> Option<Termination> {
        (minted >= U256::from(self.per_address)).then_some(Termination::AddressLimitReached)
    }

    /// `Some` when the next token id lies past the supply cap.
    pub fn check_next_token(&self, next_token_id: U256) -> Option<Termination> {
        (next_token_id > U256::from(self.total_supply)).then_some(Termination::SoldOut)
    }
}

/// Deliberate end of a session. All variants exit the process successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    MintCapReached { minted: u64 },
    AddressLimitReached,
    SoldOut,
    Aborted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::MintCapReached { minted } => write!(f, "mint count reached ({minted})"),
            Termination::AddressLimitReached => f.write_str("per-address mint limit reached"),
            Termination::SoldOut => f.write_str("sold out"),
            Termination::Aborted => f.write_str("aborted by operator"),
        }
    }
}
