//! Aegis Trader - Autonomous Trading Safety Core
//!
//! Paper-trading shell around the engine and mirror. Live market data,
//! wallet intelligence, and transaction signing are wired in by the host
//! deployment; this binary runs the exit-check loop against offline
//! stand-ins so the core can be exercised end to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use aegis_trader::config::{load_config, Config};
use aegis_trader::domain::SafetyLimits;
use aegis_trader::engine::TradingEngine;
use aegis_trader::mirror::{CopyTradeMirror, CONFIG_STORE_KEY};
use aegis_trader::ports::{
    ConfigStore, FileConfigStore, MarketDataError, MarketDataPort, PaperExecutor, TokenSnapshot,
    WalletIntelError, WalletIntelPort, WalletStats,
};

#[derive(Parser)]
#[command(name = "aegis-trader", about = "Hard-capped autonomous trading core")]
struct Cli {
    /// Log at info level
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the paper-trading loop
    Run(RunCmd),
    /// Print persisted state and the safety limit table
    Status(StatusCmd),
}

#[derive(Parser)]
struct RunCmd {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Simulated starting balance in SOL
    #[arg(long, default_value_t = 10.0)]
    paper_balance: f64,
}

#[derive(Parser)]
struct StatusCmd {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

/// Stand-in market data port until a live feed adapter is wired.
struct OfflineMarketData;

#[async_trait]
impl MarketDataPort for OfflineMarketData {
    async fn get_token(&self, _mint: &str) -> Result<Option<TokenSnapshot>, MarketDataError> {
        Ok(None)
    }
}

/// Stand-in wallet intelligence port; tracks nothing.
struct OfflineWalletIntel;

#[async_trait]
impl WalletIntelPort for OfflineWalletIntel {
    async fn is_tracked(&self, _address: &str) -> Result<bool, WalletIntelError> {
        Ok(false)
    }

    async fn get_stats(&self, _address: &str) -> Result<Option<WalletStats>, WalletIntelError> {
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets come from .env, never from config.toml
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(ref cmd) => {
            let config = load_config(&cmd.config).context("Failed to load configuration")?;
            init_logging(&cli, &config);
            run_command(cmd, config).await
        }
        Command::Status(ref cmd) => {
            let config = load_config(&cmd.config).context("Failed to load configuration")?;
            init_logging(&cli, &config);
            status_command(config).await
        }
    }
}

fn init_logging(cli: &Cli, config: &Config) {
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new(config.logging.level.clone())
    };
    fmt().with_env_filter(filter).init();
}

async fn run_command(cmd: &RunCmd, config: Config) -> Result<()> {
    info!("Starting Aegis trader...");
    warn!("PAPER TRADING MODE - no live transaction signing is wired in this build");

    let store_path = shellexpand::tilde(&config.storage.store_path).to_string();
    let store = Arc::new(FileConfigStore::new(&store_path));
    let executor = Arc::new(PaperExecutor::new(cmd.paper_balance));

    let engine = Arc::new(TradingEngine::new(
        config.engine.clone(),
        SafetyLimits::default(),
        executor,
        Arc::new(OfflineMarketData),
    ));
    engine.enable().await;

    let mirror = Arc::new(
        CopyTradeMirror::load(
            engine.clone(),
            Arc::new(OfflineWalletIntel),
            store,
            config.mirror.clone(),
        )
        .await,
    );

    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.engine.exit_check_interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in engine.check_exits().await {
                    match &event.outcome {
                        Ok(pnl) => info!(
                            id = event.position_id,
                            mint = %event.mint,
                            kind = ?event.kind,
                            pnl_sol = pnl,
                            "Position exited"
                        ),
                        Err(e) => error!(
                            id = event.position_id,
                            mint = %event.mint,
                            error = %e,
                            "Exit failed, will retry next tick"
                        ),
                    }
                }
                let stats = engine.stats().await;
                info!(
                    open = stats.open_positions,
                    exposure_sol = stats.total_exposure_sol,
                    realized_pnl_sol = stats.realized_pnl_sol,
                    "Engine heartbeat"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    engine.disable().await;
    let stats = mirror.stats().await;
    info!(
        copies_executed = stats.executed_count,
        copies_this_hour = stats.copies_this_hour,
        "Aegis trader stopped"
    );
    Ok(())
}

async fn status_command(config: Config) -> Result<()> {
    let store_path = shellexpand::tilde(&config.storage.store_path).to_string();
    let store = FileConfigStore::new(&store_path);

    let limits = SafetyLimits::default();
    println!("Safety limits (change requires redeploy):");
    println!("  max trade:           {} SOL", limits.max_trade_sol);
    println!("  max total exposure:  {} SOL", limits.max_total_exposure_sol);
    println!("  max copy exposure:   {} SOL", limits.max_copy_exposure_sol);
    println!("  min trade interval:  {}s", limits.min_trade_interval.as_secs());
    println!("  max copies per hour: {}", limits.max_copies_per_hour);
    println!("  min wallet win rate: {:.0}%", limits.min_wallet_win_rate * 100.0);
    println!(
        "  observed trade band: {} - {} SOL",
        limits.min_observed_trade_sol, limits.max_observed_trade_sol
    );
    println!("  min liquidity:       ${}", limits.min_liquidity_usd);
    println!("  loss cooldown:       {}s", limits.loss_cooldown.as_secs());

    match store.get(CONFIG_STORE_KEY).await {
        Ok(Some(raw)) => println!("\nPersisted copy-trade config: {raw}"),
        Ok(None) => println!("\nNo persisted copy-trade config (mirror starts disabled)"),
        Err(e) => println!("\nFailed to read config store: {e}"),
    }
    Ok(())
}
