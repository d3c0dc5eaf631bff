// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::{parse_b256_hex, parse_gwei, strip_0x};
use crate::domain::constants::{
    self, DEFAULT_BLOB_FEE_FLOOR_GWEI, DEFAULT_BLOB_FEE_MULTIPLIER, DEFAULT_BLOB_SCHEDULE,
    DEFAULT_MONITOR_INTERVAL_SECS, DEFAULT_RPC_URL, DEFAULT_TIP_CAP_GWEI, MINT_CONTRACT_MAINNET,
    PER_ADDRESS_LIMIT, TOTAL_SUPPLY,
};
use crate::domain::error::AppError;
use crate::domain::session::{
    AcceptanceRule, BlobFeePolicy, MintLimits, SessionConfig, parse_blob_schedule,
};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Raw operator settings as read from file + environment. Validated into a
/// [`SessionConfig`] by [`GlobalSettings::session_config`].
#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_false")]
    pub dry_run: bool,

    // Network
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub contract_address: Option<Address>,

    // Identity
    #[serde(default)]
    pub wallet_key: String,

    // Minting
    pub mint_count: Option<u64>,
    #[serde(default = "default_per_address_limit")]
    pub per_address_limit: u64,
    #[serde(default = "default_total_supply")]
    pub total_supply: u64,
    #[serde(default = "default_acceptance_rule")]
    pub acceptance_rule: String,
    pub workers: Option<usize>,

    // Fees (decimal gwei strings)
    pub max_fee_gwei: Option<String>,
    #[serde(default = "default_tip_cap_gwei")]
    pub tip_cap_gwei: String,
    #[serde(default = "default_blob_fee_multiplier")]
    pub blob_fee_multiplier: u64,
    #[serde(default = "default_blob_fee_floor_gwei")]
    pub blob_fee_floor_gwei: String,
    pub max_blob_fee_gwei: Option<String>,
    #[serde(default = "default_blob_schedule")]
    pub blob_schedule: String,

    // Observability
    pub metrics_port: Option<u16>,
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}
fn default_chain_id() -> u64 {
    constants::CHAIN_ETHEREUM
}
fn default_per_address_limit() -> u64 {
    PER_ADDRESS_LIMIT
}
fn default_total_supply() -> u64 {
    TOTAL_SUPPLY
}
fn default_acceptance_rule() -> String {
    "truncate".to_string()
}
fn default_tip_cap_gwei() -> String {
    DEFAULT_TIP_CAP_GWEI.to_string()
}
fn default_blob_fee_multiplier() -> u64 {
    DEFAULT_BLOB_FEE_MULTIPLIER
}
fn default_blob_fee_floor_gwei() -> String {
    DEFAULT_BLOB_FEE_FLOOR_GWEI.to_string()
}
fn default_blob_schedule() -> String {
    DEFAULT_BLOB_SCHEDULE.to_string()
}
fn default_monitor_interval_secs() -> u64 {
    DEFAULT_MONITOR_INTERVAL_SECS
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }

        Ok(settings)
    }

    pub fn contract(&self) -> Address {
        self.contract_address.unwrap_or(MINT_CONTRACT_MAINNET)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(constants::default_worker_count)
            .max(1)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs.max(1))
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Validate every operator-supplied value and freeze them into a session.
    ///
    /// `suggested_gas_price` (wei) is the node's current suggestion, used when no
    /// explicit `max_fee_gwei` is configured.
    pub fn session_config(
        &self,
        suggested_gas_price: Option<u128>,
    ) -> Result<SessionConfig, AppError> {
        let signer = parse_wallet_key(&self.wallet_key)?;
        let sender = signer.address();

        if self.per_address_limit == 0 {
            return Err(AppError::validation("per_address_limit", "must be at least 1"));
        }
        let max_mints = self
            .mint_count
            .ok_or_else(|| AppError::validation("mint_count", "missing"))?;
        if max_mints == 0 || max_mints > self.per_address_limit {
            return Err(AppError::validation(
                "mint_count",
                format!("must be between 1 and {}", self.per_address_limit),
            ));
        }

        let max_fee_per_gas = match self.max_fee_gwei.as_deref() {
            Some(raw) => gwei_field("max_fee_gwei", raw)?,
            None => suggested_gas_price.ok_or_else(|| {
                AppError::validation("max_fee_gwei", "missing and no suggested gas price")
            })?,
        };
        let max_priority_fee_per_gas = gwei_field("tip_cap_gwei", &self.tip_cap_gwei)?;
        if max_priority_fee_per_gas > max_fee_per_gas {
            return Err(AppError::validation("tip_cap_gwei", "tip cap exceeds max fee"));
        }

        if self.blob_fee_multiplier == 0 {
            return Err(AppError::validation("blob_fee_multiplier", "must be at least 1"));
        }
        let blob_fee = BlobFeePolicy {
            multiplier: u128::from(self.blob_fee_multiplier),
            floor: gwei_field("blob_fee_floor_gwei", &self.blob_fee_floor_gwei)?,
            ceiling: self
                .max_blob_fee_gwei
                .as_deref()
                .map(|raw| gwei_field("max_blob_fee_gwei", raw))
                .transpose()?,
        };

        Ok(SessionConfig {
            signer,
            sender,
            chain_id: self.chain_id,
            contract: self.contract(),
            max_fee_per_gas,
            max_priority_fee_per_gas,
            blob_fee,
            blob_params: parse_blob_schedule(&self.blob_schedule)?,
            acceptance_rule: self.acceptance_rule.parse::<AcceptanceRule>()?,
            limits: MintLimits {
                per_address: self.per_address_limit,
                total_supply: self.total_supply,
            },
            max_mints,
            dry_run: self.dry_run,
        })
    }
}

/// 32-byte hex private key, `0x` prefix optional.
fn parse_wallet_key(raw: &str) -> Result<PrivateKeySigner, AppError> {
    let trimmed = raw.trim();
    if strip_0x(trimmed).len() != 64 {
        return Err(AppError::validation("wallet_key", "invalid length"));
    }
    let key = parse_b256_hex(trimmed)
        .ok_or_else(|| AppError::validation("wallet_key", "not valid hex"))?;
    PrivateKeySigner::from_bytes(&key)
        .map_err(|e| AppError::validation("wallet_key", format!("invalid secp256k1 key: {e}")))
}

fn gwei_field(field: &str, raw: &str) -> Result<u128, AppError> {
    parse_gwei(raw)
        .ok_or_else(|| AppError::validation(field, format!("`{raw}` is not a gwei amount")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::eips::eip7840::BlobParams;
    use std::sync::{Mutex, OnceLock};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const GWEI: u128 = 1_000_000_000;

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            debug: false,
            log_json: false,
            dry_run: false,
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            contract_address: None,
            wallet_key: KEY.to_string(),
            mint_count: Some(3),
            per_address_limit: default_per_address_limit(),
            total_supply: default_total_supply(),
            acceptance_rule: default_acceptance_rule(),
            workers: None,
            max_fee_gwei: Some("30".to_string()),
            tip_cap_gwei: default_tip_cap_gwei(),
            blob_fee_multiplier: default_blob_fee_multiplier(),
            blob_fee_floor_gwei: default_blob_fee_floor_gwei(),
            max_blob_fee_gwei: None,
            blob_schedule: default_blob_schedule(),
            metrics_port: None,
            monitor_interval_secs: default_monitor_interval_secs(),
        }
    }

    #[test]
    fn session_from_defaults_is_valid() {
        let session = base_settings().session_config(None).expect("session");
        assert_eq!(session.max_mints, 3);
        assert_eq!(session.max_fee_per_gas, 30 * GWEI);
        assert_eq!(session.max_priority_fee_per_gas, 10_000_000);
        assert_eq!(session.blob_fee.multiplier, 2);
        assert_eq!(session.blob_fee.floor, 20 * GWEI);
        assert_eq!(session.blob_fee.ceiling, None);
        assert_eq!(session.contract, MINT_CONTRACT_MAINNET);
        assert_eq!(session.blob_params, BlobParams::bpo2());
        assert_eq!(session.acceptance_rule, AcceptanceRule::Truncate);
        assert_eq!(session.sender, session.signer.address());
    }

    #[test]
    fn wallet_key_accepts_bare_hex_and_rejects_bad_lengths() {
        let mut settings = base_settings();
        settings.wallet_key = KEY.trim_start_matches("0x").to_string();
        assert!(settings.session_config(None).is_ok());

        settings.wallet_key = "0x1234".to_string();
        let err = settings.session_config(None).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "wallet_key"));

        settings.wallet_key = format!("0x{}", "zz".repeat(32));
        assert!(settings.session_config(None).is_err());
    }

    #[test]
    fn mint_count_is_bounded_by_address_limit() {
        let mut settings = base_settings();
        settings.mint_count = Some(5);
        assert!(settings.session_config(None).is_ok());
        settings.mint_count = Some(6);
        assert!(settings.session_config(None).is_err());
        settings.mint_count = Some(0);
        assert!(settings.session_config(None).is_err());
        settings.mint_count = None;
        assert!(settings.session_config(None).is_err());
    }

    #[test]
    fn max_fee_falls_back_to_suggested_gas_price() {
        let mut settings = base_settings();
        settings.max_fee_gwei = None;
        assert!(settings.session_config(None).is_err());
        let session = settings.session_config(Some(7 * GWEI)).expect("session");
        assert_eq!(session.max_fee_per_gas, 7 * GWEI);
    }

    #[test]
    fn tip_above_fee_cap_is_rejected() {
        let mut settings = base_settings();
        settings.tip_cap_gwei = "31".to_string();
        let err = settings.session_config(None).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "tip_cap_gwei"));
    }

    #[test]
    fn blob_schedule_selects_fork_parameters() {
        let mut settings = base_settings();
        settings.blob_schedule = "prague".to_string();
        let session = settings.session_config(None).expect("session");
        assert_eq!(session.blob_params, BlobParams::prague());

        settings.blob_schedule = "bpo9".to_string();
        let err = settings.session_config(None).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "blob_schedule"));
    }

    #[test]
    fn blob_fee_ceiling_is_parsed() {
        let mut settings = base_settings();
        settings.max_blob_fee_gwei = Some("12.5".to_string());
        let session = settings.session_config(None).expect("session");
        assert_eq!(session.blob_fee.ceiling, Some(12_500_000_000));

        settings.max_blob_fee_gwei = Some("lots".to_string());
        assert!(settings.session_config(None).is_err());
    }

    #[test]
    fn worker_count_never_zero() {
        let mut settings = base_settings();
        settings.workers = Some(0);
        assert_eq!(settings.worker_count(), 1);
        settings.workers = None;
        assert!(settings.worker_count() >= 1);
    }

    #[test]
    fn env_overrides_selected_file_values() {
        let _env_lock = env_lock_guard();
        let tmp = std::env::temp_dir().join(format!(
            "blobmint-env-override-{}-{}.toml",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let body = r#"
wallet_key = "file_wallet_key"
mint_count = 2
max_fee_gwei = "15"
"#;
        std::fs::write(&tmp, body).expect("write temp config");
        let old_wallet_key = std::env::var("WALLET_KEY").ok();
        unsafe {
            std::env::set_var("WALLET_KEY", "env_wallet_key");
        }

        let loaded = GlobalSettings::load_with_path(Some(tmp.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(loaded.wallet_key, "env_wallet_key");
        assert_eq!(loaded.mint_count, Some(2));
        assert_eq!(loaded.max_fee_gwei.as_deref(), Some("15"));
        assert_eq!(loaded.tip_cap_gwei, DEFAULT_TIP_CAP_GWEI);

        std::fs::remove_file(&tmp).ok();
        if let Some(v) = old_wallet_key {
            unsafe { std::env::set_var("WALLET_KEY", v) };
        } else {
            unsafe { std::env::remove_var("WALLET_KEY") };
        }
    }
}
