//! DEX Swap
//!
//! Quote, simulate and execute aggregator swaps from the command line.

use anyhow::{Context, Result};
use auth::TradingWallet;
use clap::{Args, Parser, Subcommand};
use dex_core::config::Config;
use dex_core::types::{SwapRequest, TrackingResult};
use std::path::PathBuf;
use swap_engine::{describe_error, SwapExecutor};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dex-swap", version, about = "Aggregator-routed DEX swaps")]
struct Cli {
    /// TOML config file, layered under DEX_SWAP__* environment overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check gateway credentials, node connectivity and wallet balance
    Preflight,
    /// Quote, simulate and estimate gas without broadcasting
    Simulate(SwapArgs),
    /// Execute the swap and wait for confirmation
    Execute(SwapArgs),
}

#[derive(Args)]
struct SwapArgs {
    /// Token to sell (contract address, or the native placeholder)
    #[arg(long)]
    from: String,
    /// Token to buy
    #[arg(long)]
    to: String,
    /// Amount in the sell token's smallest unit
    #[arg(long)]
    amount: String,
    /// Slippage tolerance in percent
    #[arg(long, default_value = "0.5")]
    slippage: String,
}

impl SwapArgs {
    fn request(&self, config: &Config) -> Result<SwapRequest> {
        SwapRequest::new(
            &config.chain.chain_index,
            &self.from,
            &self.to,
            &self.amount,
            &self.slippage,
        )
        .context("Invalid swap request")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swap_cli=info,swap_engine=info,dex_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };
    let wallet = TradingWallet::from_env()?;
    let executor = SwapExecutor::from_config(&config, wallet)
        .map_err(|e| anyhow::anyhow!(describe_error(&e)))?;

    match cli.command {
        Command::Preflight => {
            let report = executor
                .preflight()
                .await
                .map_err(|e| anyhow::anyhow!(describe_error(&e)))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Simulate(args) => {
            let request = args.request(&config)?;
            let report = executor
                .simulate_only(&request)
                .await
                .map_err(|e| anyhow::anyhow!(describe_error(&e)))?;
            println!("Expected output: {}", report.to_token_amount);
            println!("Gas limit:       {}", report.gas_limit);
            println!(
                "Gas used (sim):  {}",
                report.simulation.gas_used.as_deref().unwrap_or("unknown")
            );
            if report.needs_approval {
                println!("Token approval would be sent before the swap");
            }
            for risk in &report.simulation.risks {
                warn!(risk = %risk, "Simulation flagged a risk");
            }
        }
        Command::Execute(args) => {
            let request = args.request(&config)?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping confirmation tracking");
                    on_interrupt.cancel();
                }
            });

            let outcome = executor
                .execute_with_cancel(&request, &cancel)
                .await
                .map_err(|e| anyhow::anyhow!(describe_error(&e)))?;

            info!(swap_id = %outcome.swap_id, order = %outcome.order.order_id, "Swap finished");
            if let TrackingResult::Confirmed {
                tx_hash,
                explorer_url,
            } = &outcome.result
            {
                println!("Transaction hash: {}", tx_hash);
                println!("Explorer:         {}", explorer_url);
            }
        }
    }

    Ok(())
}
