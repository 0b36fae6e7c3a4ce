//! Autonomous Trading Engine
//!
//! Decides whether a candidate token is tradeable, sizes the trade, and
//! manages the full lifecycle to exit. The engine is the only component
//! that writes to the position ledger; the copy mirror routes its entries
//! and exits through [`TradingEngine::open_copy_position`] and
//! [`TradingEngine::close_position`].
//!
//! Sizing is a fixed configured amount per trade, never weighted by signal
//! strength, and the take-profit/stop-loss thresholds are global and
//! mechanical. There is no averaging down and no stop extension.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::EngineSection;
use crate::domain::{OpenPosition, Position, PositionLedger, SafetyLimits, TradeOrigin};
use crate::ports::{
    ExecutionError, MarketDataError, MarketDataPort, SellFill, TokenSnapshot, TradeExecutor,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine is disabled")]
    Disabled,
    #[error("Position {0} not found in open set")]
    PositionNotFound(u64),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}

/// Outcome of evaluating a candidate token for entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryDecision {
    /// Enter with the fixed configured size
    Enter { size_sol: f64 },
    /// One of the entry gates failed
    Reject { reason: String },
}

impl EntryDecision {
    pub fn is_enter(&self) -> bool {
        matches!(self, EntryDecision::Enter { .. })
    }
}

/// Why an open position was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    TakeProfit,
    StopLoss,
}

/// One exit attempt from a [`TradingEngine::check_exits`] tick.
#[derive(Debug)]
pub struct ExitEvent {
    pub position_id: u64,
    pub mint: String,
    pub kind: ExitKind,
    /// Realized PnL on success, error on a failed sell (position stays open)
    pub outcome: Result<f64, EngineError>,
}

/// Aggregate engine statistics.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub enabled: bool,
    pub open_positions: usize,
    pub total_exposure_sol: f64,
    pub wins: u32,
    pub losses: u32,
    pub realized_pnl_sol: f64,
}

#[derive(Debug, Default)]
struct Tally {
    wins: u32,
    losses: u32,
    realized_pnl_sol: f64,
}

pub struct TradingEngine {
    config: EngineSection,
    limits: SafetyLimits,
    ledger: Arc<RwLock<PositionLedger>>,
    executor: Arc<dyn TradeExecutor>,
    market_data: Arc<dyn MarketDataPort>,
    enabled: RwLock<bool>,
    tally: RwLock<Tally>,
}

impl TradingEngine {
    pub fn new(
        config: EngineSection,
        limits: SafetyLimits,
        executor: Arc<dyn TradeExecutor>,
        market_data: Arc<dyn MarketDataPort>,
    ) -> Self {
        Self {
            config,
            limits,
            ledger: Arc::new(RwLock::new(PositionLedger::new())),
            executor,
            market_data,
            enabled: RwLock::new(false),
            tally: RwLock::new(Tally::default()),
        }
    }

    pub async fn enable(&self) {
        *self.enabled.write().await = true;
        info!("Trading engine enabled");
    }

    pub async fn disable(&self) {
        *self.enabled.write().await = false;
        warn!("Trading engine disabled");
    }

    pub async fn is_enabled(&self) -> bool {
        *self.enabled.read().await
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Sum of SOL in open positions, optionally scoped to one origin.
    /// Always computed fresh from the ledger.
    pub async fn total_exposure(&self, origin: Option<TradeOrigin>) -> f64 {
        self.ledger.read().await.total_exposure(origin)
    }

    pub async fn open_positions(&self) -> Vec<Position> {
        self.ledger.read().await.open_positions()
    }

    pub async fn find_open_by_mint(&self, mint: &str) -> Option<Position> {
        self.ledger.read().await.find_open_by_mint(mint).cloned()
    }

    /// Current snapshot for a mint from the shared market data port.
    pub async fn token_snapshot(
        &self,
        mint: &str,
    ) -> Result<Option<TokenSnapshot>, MarketDataError> {
        self.market_data.get_token(mint).await
    }

    pub async fn stats(&self) -> EngineStats {
        let ledger = self.ledger.read().await;
        let tally = self.tally.read().await;
        EngineStats {
            enabled: *self.enabled.read().await,
            open_positions: ledger.open_count(),
            total_exposure_sol: ledger.total_exposure(None),
            wins: tally.wins,
            losses: tally.losses,
            realized_pnl_sol: tally.realized_pnl_sol,
        }
    }

    /// Evaluate a candidate token against the entry gates.
    ///
    /// Every rejection carries the exact number that failed so the operator
    /// can act on it. Accepted entries always use the fixed configured size.
    pub async fn evaluate_candidate(&self, mint: &str) -> Result<EntryDecision, EngineError> {
        if !self.is_enabled().await {
            return Ok(EntryDecision::Reject {
                reason: "trading engine is disabled".to_string(),
            });
        }

        let Some(token) = self.market_data.get_token(mint).await? else {
            return Ok(EntryDecision::Reject {
                reason: format!("no market data for token {mint}"),
            });
        };

        if token.liquidity_usd < self.limits.min_liquidity_usd {
            return Ok(EntryDecision::Reject {
                reason: format!(
                    "liquidity ${:.0} below ${:.0} floor",
                    token.liquidity_usd, self.limits.min_liquidity_usd
                ),
            });
        }

        let mcap_ratio = token.mcap_liquidity_ratio();
        if mcap_ratio > self.config.max_mcap_liquidity_ratio {
            return Ok(EntryDecision::Reject {
                reason: format!(
                    "mcap/liquidity ratio {:.1} above {:.1} (fragile pool)",
                    mcap_ratio, self.config.max_mcap_liquidity_ratio
                ),
            });
        }

        let ratio = token.buy_sell_ratio();
        if ratio <= self.config.min_buy_sell_ratio {
            return Ok(EntryDecision::Reject {
                reason: format!(
                    "buy/sell ratio {:.2} at or below {:.2} (no buy pressure)",
                    ratio, self.config.min_buy_sell_ratio
                ),
            });
        }

        let size_sol = self.config.trade_size_sol;
        let exposure = self.total_exposure(None).await;
        if exposure + size_sol > self.limits.max_total_exposure_sol {
            return Ok(EntryDecision::Reject {
                reason: format!(
                    "exposure {:.2} + {:.2} SOL would exceed the {:.2} SOL cap",
                    exposure, size_sol, self.limits.max_total_exposure_sol
                ),
            });
        }

        debug!(mint = %mint, size_sol = size_sol, "Entry gates passed");
        Ok(EntryDecision::Enter { size_sol })
    }

    /// Evaluate a candidate and, when accepted, submit the buy.
    pub async fn evaluate_and_enter(
        &self,
        mint: &str,
    ) -> Result<EntryDecision, EngineError> {
        let decision = self.evaluate_candidate(mint).await?;
        if let EntryDecision::Enter { size_sol } = decision {
            self.enter(mint, size_sol, TradeOrigin::Strategy).await?;
        }
        Ok(decision)
    }

    /// Entry path used by the copy mirror. Gate checks are the mirror's
    /// responsibility; this only submits and records.
    pub async fn open_copy_position(
        &self,
        mint: &str,
        amount_sol: f64,
    ) -> Result<Position, EngineError> {
        if !self.is_enabled().await {
            return Err(EngineError::Disabled);
        }
        self.enter(mint, amount_sol, TradeOrigin::Copy).await
    }

    /// Submit a buy and record the resulting position. A failed submission
    /// propagates as an error and never creates a ledger entry.
    async fn enter(
        &self,
        mint: &str,
        amount_sol: f64,
        origin: TradeOrigin,
    ) -> Result<Position, EngineError> {
        let symbol = match self.market_data.get_token(mint).await? {
            Some(token) => token.symbol,
            None => mint.chars().take(8).collect(),
        };

        let fill = self.executor.buy(mint, amount_sol).await.map_err(|e| {
            error!(mint = %mint, error = %e, "Buy submission failed");
            e
        })?;

        let id = self.ledger.write().await.record_open(OpenPosition {
            mint: mint.to_string(),
            symbol,
            amount_sol,
            token_amount: fill.token_amount,
            entry_price_sol: fill.price_sol,
            entry_signature: fill.signature,
            origin,
        });

        let position = self
            .ledger
            .read()
            .await
            .get_open(id)
            .cloned()
            .ok_or(EngineError::PositionNotFound(id))?;
        Ok(position)
    }

    /// Sell an open position and move it to closed history.
    ///
    /// A failed sell leaves the position open and propagates the error; the
    /// ledger is only touched after the submission succeeds.
    pub async fn close_position(&self, position_id: u64) -> Result<SellFill, EngineError> {
        let position = self
            .ledger
            .read()
            .await
            .get_open(position_id)
            .cloned()
            .ok_or(EngineError::PositionNotFound(position_id))?;

        let fill = self.executor.sell(&position).await.map_err(|e| {
            error!(id = position_id, error = %e, "Sell submission failed");
            e
        })?;

        self.ledger.write().await.record_close(
            position_id,
            fill.signature.clone(),
            fill.realized_pnl_sol,
        );
        self.record_result(fill.realized_pnl_sol).await;

        Ok(fill)
    }

    /// Re-evaluate every open position against the exit thresholds.
    ///
    /// Exits are unconditional: take-profit at the configured multiple,
    /// stop-loss at the configured percentage. Failed sells are reported in
    /// the returned events and retried on the next tick.
    pub async fn check_exits(&self) -> Vec<ExitEvent> {
        let open = self.open_positions().await;
        let mut events = Vec::new();

        for position in open {
            let token = match self.market_data.get_token(&position.mint).await {
                Ok(Some(token)) => token,
                Ok(None) => {
                    debug!(mint = %position.mint, "No market data for open position");
                    continue;
                }
                Err(e) => {
                    warn!(mint = %position.mint, error = %e, "Market data lookup failed");
                    continue;
                }
            };

            let Some(kind) = self.exit_signal(&position, &token) else {
                continue;
            };

            let outcome = self
                .close_position(position.id)
                .await
                .map(|fill| fill.realized_pnl_sol);

            match (&kind, &outcome) {
                (ExitKind::TakeProfit, Ok(pnl)) => {
                    info!(id = position.id, symbol = %position.symbol, pnl_sol = pnl, "Take profit hit");
                }
                (ExitKind::StopLoss, Ok(pnl)) => {
                    info!(id = position.id, symbol = %position.symbol, pnl_sol = pnl, "Stop loss hit");
                }
                (_, Err(e)) => {
                    error!(id = position.id, error = %e, "Exit sell failed, position stays open");
                }
            }

            events.push(ExitEvent {
                position_id: position.id,
                mint: position.mint.clone(),
                kind,
                outcome,
            });
        }

        events
    }

    fn exit_signal(&self, position: &Position, token: &TokenSnapshot) -> Option<ExitKind> {
        if position.entry_price_sol <= 0.0 {
            return None;
        }

        let multiple = token.price_sol / position.entry_price_sol;
        if multiple >= self.config.take_profit_multiple {
            return Some(ExitKind::TakeProfit);
        }

        let ret = position.unrealized_return(token.price_sol);
        if ret <= -(self.config.stop_loss_pct / 100.0) {
            return Some(ExitKind::StopLoss);
        }

        None
    }

    async fn record_result(&self, pnl_sol: f64) {
        let mut tally = self.tally.write().await;
        if pnl_sol >= 0.0 {
            tally.wins += 1;
        } else {
            tally.losses += 1;
        }
        tally.realized_pnl_sol += pnl_sol;
    }
}
