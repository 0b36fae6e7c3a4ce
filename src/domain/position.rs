//! Position types
//!
//! An open position is exclusively owned by the trading engine; the copy
//! mirror only ever sees aggregate exposure derived from the open set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a position to be opened.
///
/// Exposure caps are enforced per origin, so this is a closed set rather
/// than a free-text tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOrigin {
    /// Opened by the engine's own entry evaluation
    Strategy,
    /// Opened by mirroring an observed smart-money wallet
    Copy,
}

impl std::fmt::Display for TradeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeOrigin::Strategy => write!(f, "strategy"),
            TradeOrigin::Copy => write!(f, "copy"),
        }
    }
}

/// Open/closed lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One autonomous stake in a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Ledger-assigned id, unique per process
    pub id: u64,
    /// Token mint address
    pub mint: String,
    /// Token symbol for display
    pub symbol: String,
    /// SOL committed at entry
    pub amount_sol: f64,
    /// Token amount received (base units)
    pub token_amount: u64,
    /// Entry price in SOL per token
    pub entry_price_sol: f64,
    /// Transaction signature of the entry trade
    pub entry_signature: String,
    /// Exit transaction signature once closed
    pub exit_signature: Option<String>,
    /// What opened this position
    pub origin: TradeOrigin,
    pub status: PositionStatus,
    /// Realized PnL in SOL, set when closed
    pub realized_pnl_sol: Option<f64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Unrealized return as a fraction of entry (+1.0 = doubled)
    pub fn unrealized_return(&self, current_price_sol: f64) -> f64 {
        if self.entry_price_sol <= 0.0 {
            return 0.0;
        }
        (current_price_sol - self.entry_price_sol) / self.entry_price_sol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            id: 1,
            mint: "mint1".to_string(),
            symbol: "TEST".to_string(),
            amount_sol: 0.5,
            token_amount: 1_000_000_000,
            entry_price_sol: 0.0005,
            entry_signature: "sig1".to_string(),
            exit_signature: None,
            origin: TradeOrigin::Strategy,
            status: PositionStatus::Open,
            realized_pnl_sol: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_unrealized_return() {
        let pos = sample_position();
        assert!((pos.unrealized_return(0.001) - 1.0).abs() < 1e-9);
        assert!((pos.unrealized_return(0.00025) - (-0.5)).abs() < 1e-9);
        assert_eq!(pos.unrealized_return(0.0005), 0.0);
    }

    #[test]
    fn test_zero_entry_price_is_flat() {
        let mut pos = sample_position();
        pos.entry_price_sol = 0.0;
        assert_eq!(pos.unrealized_return(1.0), 0.0);
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(TradeOrigin::Strategy.to_string(), "strategy");
        assert_eq!(TradeOrigin::Copy.to_string(), "copy");
    }
}
