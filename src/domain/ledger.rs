//! Position Ledger
//!
//! Tracks currently-open autonomous positions and their aggregate exposure.
//! Exposure is always summed freshly from the open set; no cached aggregate
//! is kept, so callers gating real capital never see a stale number.
//!
//! The ledger performs no validation on open/close - deciding whether a
//! trade is allowed is the caller's job before it gets here.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use super::position::{Position, PositionStatus, TradeOrigin};

/// Parameters for recording a newly opened position.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub mint: String,
    pub symbol: String,
    pub amount_sol: f64,
    pub token_amount: u64,
    pub entry_price_sol: f64,
    pub entry_signature: String,
    pub origin: TradeOrigin,
}

/// In-memory ledger of open positions plus closed history.
#[derive(Debug, Default)]
pub struct PositionLedger {
    open: HashMap<u64, Position>,
    closed: Vec<Position>,
    next_id: u64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
            closed: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a new open position and return its id.
    pub fn record_open(&mut self, params: OpenPosition) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let position = Position {
            id,
            mint: params.mint,
            symbol: params.symbol,
            amount_sol: params.amount_sol,
            token_amount: params.token_amount,
            entry_price_sol: params.entry_price_sol,
            entry_signature: params.entry_signature,
            exit_signature: None,
            origin: params.origin,
            status: PositionStatus::Open,
            realized_pnl_sol: None,
            opened_at: Utc::now(),
            closed_at: None,
        };

        info!(
            id = id,
            symbol = %position.symbol,
            amount_sol = position.amount_sol,
            origin = %position.origin,
            "Position opened"
        );

        self.open.insert(id, position);
        id
    }

    /// Move a position out of the open set, recording its realized PnL.
    ///
    /// Returns the closed position, or None if the id is unknown or already
    /// closed.
    pub fn record_close(
        &mut self,
        id: u64,
        exit_signature: String,
        realized_pnl_sol: f64,
    ) -> Option<Position> {
        let mut position = self.open.remove(&id)?;
        position.status = PositionStatus::Closed;
        position.exit_signature = Some(exit_signature);
        position.realized_pnl_sol = Some(realized_pnl_sol);
        position.closed_at = Some(Utc::now());

        info!(
            id = id,
            symbol = %position.symbol,
            pnl_sol = realized_pnl_sol,
            "Position closed"
        );

        self.closed.push(position.clone());
        Some(position)
    }

    /// Sum of SOL committed to open positions, optionally scoped to one
    /// origin. Computed fresh on every call.
    pub fn total_exposure(&self, origin: Option<TradeOrigin>) -> f64 {
        self.open
            .values()
            .filter(|p| origin.map_or(true, |o| p.origin == o))
            .map(|p| p.amount_sol)
            .sum()
    }

    pub fn get_open(&self, id: u64) -> Option<&Position> {
        self.open.get(&id)
    }

    /// First open position for a mint, if any.
    pub fn find_open_by_mint(&self, mint: &str) -> Option<&Position> {
        self.open.values().find(|p| p.mint == mint)
    }

    pub fn open_positions(&self) -> Vec<Position> {
        self.open.values().cloned().collect()
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
