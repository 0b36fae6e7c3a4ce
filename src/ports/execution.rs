//! Trade Execution Port
//!
//! Contract for the opaque transaction-submission capability. The signing
//! and RPC layer lives outside this crate; callers get exactly one
//! submission per logical intent and no automatic retry.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Position;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),
    #[error("Insufficient balance: have {have:.4} SOL, need {need:.4} SOL")]
    InsufficientBalance { have: f64, need: f64 },
    #[error("No market price available for {0}")]
    NoPrice(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Confirmed entry fill.
#[derive(Debug, Clone)]
pub struct BuyFill {
    /// Transaction signature
    pub signature: String,
    /// Token amount received (base units)
    pub token_amount: u64,
    /// Effective price in SOL per token
    pub price_sol: f64,
}

/// Confirmed exit fill.
#[derive(Debug, Clone)]
pub struct SellFill {
    /// Transaction signature
    pub signature: String,
    /// SOL received
    pub sol_received: f64,
    /// Realized PnL in SOL against the position's cost basis
    pub realized_pnl_sol: f64,
}

/// Submit trades on behalf of the user. Implementations must be safe to
/// call at most once per intent; the engine never retries a failure.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    async fn buy(&self, mint: &str, amount_sol: f64) -> Result<BuyFill, ExecutionError>;

    async fn sell(&self, position: &Position) -> Result<SellFill, ExecutionError>;
}

/// Simulated executor with a paper SOL balance and configurable prices.
///
/// Default executor for the binary (the real signing layer is an external
/// collaborator) and the failure-path fixture in tests.
pub struct PaperExecutor {
    state: Mutex<PaperState>,
    /// Simulated slippage in basis points (50 = 0.5%)
    slippage_bps: u16,
}

#[derive(Debug)]
struct PaperState {
    sol_balance: f64,
    prices: HashMap<String, f64>,
    next_signature: u64,
}

impl PaperExecutor {
    pub fn new(initial_sol: f64) -> Self {
        Self {
            state: Mutex::new(PaperState {
                sol_balance: initial_sol,
                prices: HashMap::new(),
                next_signature: 1,
            }),
            slippage_bps: 50,
        }
    }

    pub fn with_slippage(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    /// Set the simulated market price for a mint (SOL per token).
    pub fn set_price(&self, mint: &str, price_sol: f64) {
        let mut state = self.state.lock().expect("paper state poisoned");
        state.prices.insert(mint.to_string(), price_sol);
    }

    pub fn sol_balance(&self) -> f64 {
        self.state.lock().expect("paper state poisoned").sol_balance
    }
}

#[async_trait]
impl TradeExecutor for PaperExecutor {
    async fn buy(&self, mint: &str, amount_sol: f64) -> Result<BuyFill, ExecutionError> {
        if amount_sol <= 0.0 {
            return Err(ExecutionError::InvalidParameters(
                "buy amount must be positive".to_string(),
            ));
        }

        let mut state = self.state.lock().expect("paper state poisoned");

        let price = *state
            .prices
            .get(mint)
            .ok_or_else(|| ExecutionError::NoPrice(mint.to_string()))?;

        if amount_sol > state.sol_balance {
            return Err(ExecutionError::InsufficientBalance {
                have: state.sol_balance,
                need: amount_sol,
            });
        }

        // Buys fill at a worse (higher) price
        let effective_price = price * (1.0 + self.slippage_bps as f64 / 10_000.0);
        let token_amount = (amount_sol / effective_price * 1e9) as u64;

        state.sol_balance -= amount_sol;
        let signature = format!("paper-buy-{}", state.next_signature);
        state.next_signature += 1;

        Ok(BuyFill {
            signature,
            token_amount,
            price_sol: effective_price,
        })
    }

    async fn sell(&self, position: &Position) -> Result<SellFill, ExecutionError> {
        let mut state = self.state.lock().expect("paper state poisoned");

        let price = *state
            .prices
            .get(&position.mint)
            .ok_or_else(|| ExecutionError::NoPrice(position.mint.clone()))?;

        // Sells fill at a worse (lower) price
        let effective_price = price * (1.0 - self.slippage_bps as f64 / 10_000.0);
        let sol_received = position.token_amount as f64 / 1e9 * effective_price;
        let realized_pnl_sol = sol_received - position.amount_sol;

        state.sol_balance += sol_received;
        let signature = format!("paper-sell-{}", state.next_signature);
        state.next_signature += 1;

        Ok(SellFill {
            signature,
            sol_received,
            realized_pnl_sol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionStatus, TradeOrigin};
    use chrono::Utc;

    fn position(mint: &str, amount_sol: f64, token_amount: u64) -> Position {
        Position {
            id: 1,
            mint: mint.to_string(),
            symbol: "TEST".to_string(),
            amount_sol,
            token_amount,
            entry_price_sol: amount_sol / (token_amount as f64 / 1e9),
            entry_signature: "sig".to_string(),
            exit_signature: None,
            origin: TradeOrigin::Strategy,
            status: PositionStatus::Open,
            realized_pnl_sol: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[tokio::test]
    async fn test_paper_buy_deducts_balance() {
        let executor = PaperExecutor::new(10.0).with_slippage(0);
        executor.set_price("mint1", 0.001);

        let fill = executor.buy("mint1", 1.0).await.unwrap();

        assert_eq!(fill.token_amount, 1_000_000_000_000);
        assert!((executor.sol_balance() - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_paper_buy_insufficient_balance() {
        let executor = PaperExecutor::new(0.5);
        executor.set_price("mint1", 0.001);

        let result = executor.buy("mint1", 1.0).await;
        assert!(matches!(
            result,
            Err(ExecutionError::InsufficientBalance { .. })
        ));
    }

    #[tokio::test]
    async fn test_paper_buy_no_price() {
        let executor = PaperExecutor::new(10.0);
        let result = executor.buy("unknown", 1.0).await;
        assert!(matches!(result, Err(ExecutionError::NoPrice(_))));
    }

    #[tokio::test]
    async fn test_paper_sell_realizes_pnl() {
        let executor = PaperExecutor::new(10.0).with_slippage(0);
        executor.set_price("mint1", 0.001);

        let fill = executor.buy("mint1", 1.0).await.unwrap();
        let pos = position("mint1", 1.0, fill.token_amount);

        // Price doubled since entry
        executor.set_price("mint1", 0.002);
        let sell = executor.sell(&pos).await.unwrap();

        assert!((sell.realized_pnl_sol - 1.0).abs() < 1e-6);
        assert!((executor.sol_balance() - 11.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_slippage_worsens_fills() {
        let executor = PaperExecutor::new(10.0).with_slippage(100);
        executor.set_price("mint1", 0.001);

        let fill = executor.buy("mint1", 1.0).await.unwrap();
        assert!(fill.price_sol > 0.001);
    }
}
