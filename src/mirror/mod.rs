//! Copy-Trade Mirror
//!
//! Mirrors trades observed from tracked smart-money wallets, gated by a
//! fixed sequence of safety checks. Every observed trade passes through
//! the full gate chain before any SOL moves; refusals come back as
//! decisions with the exact number or state that failed, never as errors.
//!
//! Gate checks and execution are separate steps (a trade may sit pending
//! for human approval between them), so state read at check time can be
//! stale by execution time. The enable flags are therefore re-checked
//! immediately before execution; the exposure and rate-limit reads are
//! not, which is an accepted race for a single-operator deployment.

mod types;

pub use types::{
    CopyAction, CopyDecision, CopyTradeConfig, CopyTradeConfigUpdate, ExecutionRecord,
    MirrorStats, PendingCopyTrade, PendingStatus, SafetyCounters, WalletTradeEvent,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MirrorSection;
use crate::domain::{SafetyLimits, TradeOrigin};
use crate::engine::TradingEngine;
use crate::ports::{ConfigStore, WalletIntelPort};

/// Exact phrase required to enable the mirror.
pub const ENABLE_CONFIRMATION_PHRASE: &str = "COPY TRADING ENABLED";

/// Key the mirror configuration is persisted under in the config store.
pub const CONFIG_STORE_KEY: &str = "copy_trade_config";

/// How long a pending trade stays approvable before it goes stale.
const PENDING_TRADE_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("confirmation phrase does not match, copy trading not enabled")]
    NotConfirmed,
    #[error("copy trading was disabled")]
    CopyTradingDisabled,
    #[error("trading engine is disabled")]
    EngineDisabled,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("copy trade {0} not found")]
    TradeNotFound(u64),
    #[error("copy trade {id} already settled as {status}")]
    AlreadySettled { id: u64, status: PendingStatus },
    #[error("copy trade {0} expired before approval")]
    TradeExpired(u64),
    #[error("copy trade execution failed: {0}")]
    ExecutionFailed(String),
}

pub struct CopyTradeMirror {
    limits: SafetyLimits,
    bounds: MirrorSection,
    engine: Arc<TradingEngine>,
    wallet_intel: Arc<dyn WalletIntelPort>,
    store: Arc<dyn ConfigStore>,
    config: RwLock<CopyTradeConfig>,
    pending: RwLock<HashMap<u64, PendingCopyTrade>>,
    executions: RwLock<Vec<ExecutionRecord>>,
    counters: RwLock<SafetyCounters>,
    next_id: AtomicU64,
}

impl CopyTradeMirror {
    pub fn new(
        engine: Arc<TradingEngine>,
        wallet_intel: Arc<dyn WalletIntelPort>,
        store: Arc<dyn ConfigStore>,
        bounds: MirrorSection,
        config: CopyTradeConfig,
    ) -> Self {
        let limits = *engine.limits();
        Self {
            limits,
            bounds,
            engine,
            wallet_intel,
            store,
            config: RwLock::new(config),
            pending: RwLock::new(HashMap::new()),
            executions: RwLock::new(Vec::new()),
            counters: RwLock::new(SafetyCounters::new(Utc::now())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Construct the mirror with configuration restored from the store.
    ///
    /// Missing, unreadable, or corrupt state falls back to the disabled
    /// defaults; the mirror never starts enabled by accident.
    pub async fn load(
        engine: Arc<TradingEngine>,
        wallet_intel: Arc<dyn WalletIntelPort>,
        store: Arc<dyn ConfigStore>,
        bounds: MirrorSection,
    ) -> Self {
        let config = match store.get(CONFIG_STORE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<CopyTradeConfig>(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "Stored copy-trade config is corrupt, using defaults");
                    CopyTradeConfig::default()
                }
            },
            Ok(None) => CopyTradeConfig::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read copy-trade config, using defaults");
                CopyTradeConfig::default()
            }
        };
        info!(enabled = config.enabled, "Copy-trade mirror loaded");
        Self::new(engine, wallet_intel, store, bounds, config)
    }

    // ===== Control surface =====

    /// Enable the mirror. Requires the literal confirmation phrase so a
    /// fat-fingered API call cannot turn on live copying, and an enabled
    /// engine so copies have somewhere to execute.
    pub async fn enable(&self, confirmation: &str) -> Result<(), MirrorError> {
        if confirmation != ENABLE_CONFIRMATION_PHRASE {
            return Err(MirrorError::NotConfirmed);
        }
        if !self.engine.is_enabled().await {
            return Err(MirrorError::EngineDisabled);
        }
        {
            let mut config = self.config.write().await;
            config.enabled = true;
            self.persist(&config).await;
        }
        info!("Copy trading enabled");
        Ok(())
    }

    pub async fn disable(&self) {
        let mut config = self.config.write().await;
        config.enabled = false;
        self.persist(&config).await;
        warn!("Copy trading disabled");
    }

    pub async fn is_enabled(&self) -> bool {
        self.config.read().await.enabled
    }

    pub async fn config(&self) -> CopyTradeConfig {
        self.config.read().await.clone()
    }

    /// Apply a partial configuration update. The size multiplier must fall
    /// within the configured bounds; the enable flag is only reachable
    /// through [`enable`](Self::enable) and [`disable`](Self::disable).
    pub async fn update_config(
        &self,
        update: CopyTradeConfigUpdate,
    ) -> Result<CopyTradeConfig, MirrorError> {
        if let Some(multiplier) = update.size_multiplier {
            if multiplier < self.bounds.min_size_multiplier
                || multiplier > self.bounds.max_size_multiplier
            {
                return Err(MirrorError::InvalidConfig(format!(
                    "size_multiplier must be between {} and {}, got {}",
                    self.bounds.min_size_multiplier, self.bounds.max_size_multiplier, multiplier
                )));
            }
        }

        let mut config = self.config.write().await;
        if let Some(whitelist) = update.whitelist {
            config.whitelist = whitelist;
        }
        if let Some(multiplier) = update.size_multiplier {
            config.size_multiplier = multiplier;
        }
        if let Some(buys_only) = update.copy_buys_only {
            config.copy_buys_only = buys_only;
        }
        if let Some(require_approval) = update.require_approval {
            config.require_approval = require_approval;
        }
        self.persist(&config).await;
        info!(
            multiplier = config.size_multiplier,
            buys_only = config.copy_buys_only,
            require_approval = config.require_approval,
            "Copy-trade config updated"
        );
        Ok(config.clone())
    }

    /// Write the configuration through to the store. A failed write keeps
    /// the in-memory state authoritative and is logged, not propagated.
    async fn persist(&self, config: &CopyTradeConfig) {
        let raw = match serde_json::to_string(config) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize copy-trade config");
                return;
            }
        };
        if let Err(e) = self.store.upsert(CONFIG_STORE_KEY, &raw).await {
            warn!(error = %e, "Failed to persist copy-trade config");
        }
    }

    // ===== Observation path =====

    /// Run an observed smart-money trade through the full gate chain.
    ///
    /// Gates run in a fixed order and the first failure wins; the reason
    /// always carries the number or state that failed. A trade that clears
    /// every gate either executes immediately or is queued for approval,
    /// depending on `require_approval`.
    pub async fn handle_observed_trade(&self, event: &WalletTradeEvent) -> CopyDecision {
        let config = self.config.read().await.clone();

        if !config.enabled {
            return CopyDecision::refuse("copy trading is disabled");
        }

        match self.wallet_intel.is_tracked(&event.wallet).await {
            Ok(true) => {}
            Ok(false) => {
                return CopyDecision::refuse(format!(
                    "wallet {} is not on the tracked smart-money list",
                    event.wallet
                ));
            }
            Err(e) => {
                return CopyDecision::refuse(format!("wallet eligibility lookup failed: {e}"));
            }
        }

        if !config.whitelist.is_empty() && !config.whitelist.contains(&event.wallet) {
            return CopyDecision::refuse(format!(
                "wallet {} is not on the configured whitelist",
                event.wallet
            ));
        }

        let stats = match self.wallet_intel.get_stats(&event.wallet).await {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                return CopyDecision::refuse(format!(
                    "wallet {} has no track record",
                    event.wallet
                ));
            }
            Err(e) => {
                return CopyDecision::refuse(format!("wallet stats lookup failed: {e}"));
            }
        };
        if stats.win_rate < self.limits.min_wallet_win_rate {
            return CopyDecision::refuse(format!(
                "wallet {} win rate {:.1}% below {:.1}% minimum",
                stats.label,
                stats.win_rate * 100.0,
                self.limits.min_wallet_win_rate * 100.0
            ));
        }

        if config.copy_buys_only && event.action == CopyAction::Sell {
            return CopyDecision::refuse("configured to copy buys only");
        }

        if event.amount_sol < self.limits.min_observed_trade_sol {
            return CopyDecision::refuse(format!(
                "observed trade {:.3} SOL below {:.3} SOL noise floor",
                event.amount_sol, self.limits.min_observed_trade_sol
            ));
        }
        if event.amount_sol > self.limits.max_observed_trade_sol {
            return CopyDecision::refuse(format!(
                "observed trade {:.1} SOL above {:.1} SOL ceiling",
                event.amount_sol, self.limits.max_observed_trade_sol
            ));
        }

        let now = Utc::now();
        {
            let mut counters = self.counters.write().await;
            counters.roll_window(now);

            if counters.copies_this_hour >= self.limits.max_copies_per_hour {
                return CopyDecision::refuse(format!(
                    "hourly copy limit reached ({}/{} this window)",
                    counters.copies_this_hour, self.limits.max_copies_per_hour
                ));
            }

            if let Some(last) = counters.last_copy_at {
                let elapsed = (now - last).to_std().unwrap_or_default();
                if elapsed < self.limits.min_trade_interval {
                    let remaining = self.limits.min_trade_interval - elapsed;
                    return CopyDecision::refuse(format!(
                        "minimum {}s between copy trades, {}s remaining",
                        self.limits.min_trade_interval.as_secs(),
                        remaining.as_secs()
                    ));
                }
            }

            if let Some(last_loss) = counters.last_loss_at {
                let elapsed = (now - last_loss).to_std().unwrap_or_default();
                if elapsed < self.limits.loss_cooldown {
                    let remaining = self.limits.loss_cooldown - elapsed;
                    return CopyDecision::refuse(format!(
                        "loss cooldown active, {}s remaining",
                        remaining.as_secs()
                    ));
                }
            }
        }

        // Size first, then gate on the size that would actually trade.
        let suggested = (event.amount_sol * config.size_multiplier).min(self.limits.max_trade_sol);
        let copy_exposure = self.engine.total_exposure(Some(TradeOrigin::Copy)).await;
        if copy_exposure + suggested >= self.limits.max_copy_exposure_sol {
            return CopyDecision::refuse(format!(
                "copy exposure {:.2} SOL plus {:.2} SOL would reach the {:.2} SOL cap",
                copy_exposure, suggested, self.limits.max_copy_exposure_sol
            ));
        }
        // Never let a copy push exposure past the cap, whatever the gate saw
        let suggested = suggested.min(self.limits.max_copy_exposure_sol - copy_exposure);

        if event.action == CopyAction::Buy {
            match self.engine.token_snapshot(&event.mint).await {
                Ok(Some(token)) => {
                    if token.liquidity_usd < self.limits.min_liquidity_usd {
                        return CopyDecision::refuse(format!(
                            "liquidity ${:.0} below ${:.0} minimum",
                            token.liquidity_usd, self.limits.min_liquidity_usd
                        ));
                    }
                }
                Ok(None) => {
                    return CopyDecision::refuse(format!("no market data for {}", event.mint));
                }
                Err(e) => {
                    return CopyDecision::refuse(format!("market data lookup failed: {e}"));
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let trade = PendingCopyTrade {
            id,
            wallet: event.wallet.clone(),
            wallet_label: stats.label.clone(),
            action: event.action,
            mint: event.mint.clone(),
            symbol: event.symbol.clone(),
            observed_amount_sol: event.amount_sol,
            suggested_amount_sol: suggested,
            created_at: now,
            expires_at: now + ChronoDuration::seconds(PENDING_TRADE_TTL_SECS),
            status: PendingStatus::Pending,
            note: None,
        };
        self.pending.write().await.insert(id, trade);
        debug!(
            id,
            wallet = %stats.label,
            action = %event.action,
            size_sol = suggested,
            "Copy trade cleared all gates"
        );

        if config.require_approval {
            return CopyDecision {
                should_copy: true,
                reason: format!(
                    "{} {} at {:.3} SOL awaiting approval",
                    event.action, event.symbol, suggested
                ),
                pending_trade_id: Some(id),
            };
        }

        match self.execute(id, false).await {
            Ok(record) => CopyDecision {
                should_copy: true,
                reason: format!(
                    "executed {} {} at {:.3} SOL",
                    record.action, record.symbol, record.amount_sol
                ),
                pending_trade_id: Some(id),
            },
            Err(e) => CopyDecision {
                should_copy: false,
                reason: format!("execution failed: {e}"),
                pending_trade_id: Some(id),
            },
        }
    }

    // ===== Approval path =====

    /// Approve and execute a pending copy trade.
    ///
    /// Approval is single-shot: once a trade has settled in any terminal
    /// state, approving it again is an error naming that state. A trade
    /// past its expiry is marked expired instead of executing.
    pub async fn approve_trade(&self, id: u64) -> Result<ExecutionRecord, MirrorError> {
        {
            let mut pending = self.pending.write().await;
            let trade = pending.get_mut(&id).ok_or(MirrorError::TradeNotFound(id))?;

            if trade.status != PendingStatus::Pending {
                return Err(MirrorError::AlreadySettled {
                    id,
                    status: trade.status,
                });
            }
            if trade.is_expired_at(Utc::now()) {
                trade.status = PendingStatus::Expired;
                warn!(id, "Copy trade expired before approval");
                return Err(MirrorError::TradeExpired(id));
            }
        }

        self.execute(id, true).await
    }

    /// Reject a pending copy trade without executing it.
    pub async fn reject_trade(&self, id: u64) -> Result<(), MirrorError> {
        let mut pending = self.pending.write().await;
        let trade = pending.get_mut(&id).ok_or(MirrorError::TradeNotFound(id))?;

        if trade.status != PendingStatus::Pending {
            return Err(MirrorError::AlreadySettled {
                id,
                status: trade.status,
            });
        }
        trade.status = PendingStatus::Rejected;
        trade.note = Some("rejected by operator".to_string());
        info!(id, "Copy trade rejected by operator");
        Ok(())
    }

    /// Execute a gate-cleared trade through the engine.
    ///
    /// The enable flags are re-checked here because the trade may have
    /// waited arbitrarily long since the gates ran; a refusal on those
    /// flags leaves the trade pending. Engine failures settle it rejected
    /// with the failure message attached. Only approved trades pass
    /// through the Approved status; the auto path settles straight from
    /// Pending.
    async fn execute(&self, id: u64, via_approval: bool) -> Result<ExecutionRecord, MirrorError> {
        if !self.config.read().await.enabled {
            return Err(MirrorError::CopyTradingDisabled);
        }
        if !self.engine.is_enabled().await {
            return Err(MirrorError::EngineDisabled);
        }

        let trade = {
            let mut pending = self.pending.write().await;
            let trade = pending.get_mut(&id).ok_or(MirrorError::TradeNotFound(id))?;
            if via_approval {
                trade.status = PendingStatus::Approved;
            }
            trade.clone()
        };

        let outcome = match trade.action {
            CopyAction::Buy => self
                .engine
                .open_copy_position(&trade.mint, trade.suggested_amount_sol)
                .await
                .map(|position| (position.entry_signature, None, position.amount_sol)),
            CopyAction::Sell => match self.engine.find_open_by_mint(&trade.mint).await {
                Some(position) => {
                    let closed_amount = position.amount_sol;
                    self.engine
                        .close_position(position.id)
                        .await
                        .map(|fill| (fill.signature, Some(fill.realized_pnl_sol), closed_amount))
                }
                None => {
                    self.settle_rejected(id, "no matching open position").await;
                    return Err(MirrorError::ExecutionFailed(format!(
                        "no matching open position for {}",
                        trade.mint
                    )));
                }
            },
        };

        let (signature, realized_pnl_sol, amount_sol) = match outcome {
            Ok(fill) => fill,
            Err(e) => {
                self.settle_rejected(id, &e.to_string()).await;
                return Err(MirrorError::ExecutionFailed(e.to_string()));
            }
        };

        let now = Utc::now();
        {
            let mut pending = self.pending.write().await;
            if let Some(trade) = pending.get_mut(&id) {
                trade.status = PendingStatus::Executed;
            }
        }
        {
            let mut counters = self.counters.write().await;
            counters.roll_window(now);
            counters.record_execution(now);
            if realized_pnl_sol.is_some_and(|pnl| pnl < 0.0) {
                counters.record_loss(now);
            }
        }

        let record = ExecutionRecord {
            pending_id: id,
            wallet_label: trade.wallet_label,
            action: trade.action,
            mint: trade.mint,
            symbol: trade.symbol,
            amount_sol,
            signature,
            realized_pnl_sol,
            executed_at: now,
        };
        info!(
            id,
            wallet = %record.wallet_label,
            action = %record.action,
            size_sol = record.amount_sol,
            signature = %record.signature,
            "Copy trade executed"
        );
        self.executions.write().await.push(record.clone());
        Ok(record)
    }

    async fn settle_rejected(&self, id: u64, reason: &str) {
        let mut pending = self.pending.write().await;
        if let Some(trade) = pending.get_mut(&id) {
            trade.status = PendingStatus::Rejected;
            trade.note = Some(reason.to_string());
            warn!(id, reason, "Copy trade execution failed");
        }
    }

    // ===== Introspection =====

    /// All tracked pending trades, oldest first. Trades past their expiry
    /// are settled expired before the list is returned.
    pub async fn pending_trades(&self) -> Vec<PendingCopyTrade> {
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        for trade in pending.values_mut() {
            if trade.status == PendingStatus::Pending && trade.is_expired_at(now) {
                trade.status = PendingStatus::Expired;
            }
        }
        let mut trades: Vec<PendingCopyTrade> = pending.values().cloned().collect();
        trades.sort_by_key(|t| t.id);
        trades
    }

    /// The most recent executions, newest first.
    pub async fn recent_executions(&self, limit: usize) -> Vec<ExecutionRecord> {
        let executions = self.executions.read().await;
        executions.iter().rev().take(limit).cloned().collect()
    }

    pub fn safety_limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub async fn stats(&self) -> MirrorStats {
        let config = self.config.read().await;
        let counters = self.counters.read().await;
        let pending = self.pending.read().await;
        let executions = self.executions.read().await;
        MirrorStats {
            enabled: config.enabled,
            require_approval: config.require_approval,
            copies_this_hour: counters.copies_this_hour,
            last_copy_at: counters.last_copy_at,
            last_loss_at: counters.last_loss_at,
            pending_count: pending
                .values()
                .filter(|t| t.status == PendingStatus::Pending)
                .count(),
            executed_count: executions.len(),
            copy_exposure_sol: self.engine.total_exposure(Some(TradeOrigin::Copy)).await,
        }
    }
}
