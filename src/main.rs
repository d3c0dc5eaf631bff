// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use blobmint::app::config::GlobalSettings;
use blobmint::app::logging::setup_logging;
use blobmint::domain::error::AppError;
use blobmint::infrastructure::network::gas::suggested_gas_price;
use blobmint::infrastructure::network::provider::ConnectionFactory;
use blobmint::services::mining::engine::{Engine, EngineOptions};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "blobmint: mine and submit blob mint transactions")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Build and check transactions, never broadcast
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Mining worker threads (overrides config/env)
    #[arg(long)]
    workers: Option<usize>,

    /// Metrics port (overrides config/env)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if cli.dry_run {
        settings.dry_run = true;
    }
    if let Some(workers) = cli.workers {
        settings.workers = Some(workers);
    }
    if let Some(port) = cli.metrics_port {
        settings.metrics_port = Some(port);
    }
    setup_logging(settings.log_level(), settings.log_json || cli.log_json);

    let provider = ConnectionFactory::dial(&settings.rpc_url).await?;
    ConnectionFactory::ensure_chain_id(&provider, settings.chain_id).await?;

    let suggested = if settings.max_fee_gwei.is_none() {
        Some(suggested_gas_price(&provider).await?)
    } else {
        None
    };
    let session = settings.session_config(suggested)?;

    tracing::info!(
        target: "config",
        rpc = %settings.rpc_url,
        chain_id = session.chain_id,
        sender = %session.sender,
        contract = %session.contract,
        max_mints = session.max_mints,
        max_fee_per_gas = session.max_fee_per_gas,
        max_priority_fee_per_gas = session.max_priority_fee_per_gas,
        blob_target_gas = session.blob_params.target_blob_gas_per_block(),
        blob_update_fraction = session.blob_params.update_fraction,
        acceptance_rule = ?session.acceptance_rule,
        dry_run = session.dry_run,
        "session configured"
    );

    let options = EngineOptions {
        workers: settings.worker_count(),
        monitor_interval: settings.monitor_interval(),
        metrics_port: settings.metrics_port,
    };
    let termination = Engine::new(provider, session, options).run().await?;
    tracing::info!(target: "engine", reason = %termination, "exiting");

    Ok(())
}
