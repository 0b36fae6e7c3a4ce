//! Safety Limits Registry
//!
//! The hard-coded threshold table every trading decision consults. There is
//! deliberately no mutation path: raising a limit means editing this file and
//! redeploying, which is the point at which an operator consciously accepts
//! more risk.

use std::time::Duration;

/// Maximum SOL committed to any single trade
pub const MAX_TRADE_SOL: f64 = 0.5;

/// Maximum aggregate SOL across all open autonomous positions
pub const MAX_TOTAL_EXPOSURE_SOL: f64 = 5.0;

/// Maximum aggregate SOL across open copy-originated positions
pub const MAX_COPY_EXPOSURE_SOL: f64 = 2.0;

/// Minimum elapsed time between executed copy trades
pub const MIN_TRADE_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum copy trades per hour (fixed-interval window, not sliding)
pub const MAX_COPIES_PER_HOUR: u32 = 5;

/// Minimum historical win rate for a source wallet to be mirrored (inclusive)
pub const MIN_WALLET_WIN_RATE: f64 = 0.6;

/// Observed trades below this are noise and ignored
pub const MIN_OBSERVED_TRADE_SOL: f64 = 0.1;

/// Observed trades above this look like whale manipulation and are ignored
pub const MAX_OBSERVED_TRADE_SOL: f64 = 50.0;

/// Minimum pool liquidity in USD before any buy (inclusive)
pub const MIN_LIQUIDITY_USD: f64 = 10_000.0;

/// Mandatory wait after a realized copy-trade loss
pub const LOSS_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// The full constant limit set, consumed read-only by the engine and mirror.
#[derive(Debug, Clone, Copy)]
pub struct SafetyLimits {
    pub max_trade_sol: f64,
    pub max_total_exposure_sol: f64,
    pub max_copy_exposure_sol: f64,
    pub min_trade_interval: Duration,
    pub max_copies_per_hour: u32,
    pub min_wallet_win_rate: f64,
    pub min_observed_trade_sol: f64,
    pub max_observed_trade_sol: f64,
    pub min_liquidity_usd: f64,
    pub loss_cooldown: Duration,
}

impl SafetyLimits {
    pub const DEFAULT: SafetyLimits = SafetyLimits {
        max_trade_sol: MAX_TRADE_SOL,
        max_total_exposure_sol: MAX_TOTAL_EXPOSURE_SOL,
        max_copy_exposure_sol: MAX_COPY_EXPOSURE_SOL,
        min_trade_interval: MIN_TRADE_INTERVAL,
        max_copies_per_hour: MAX_COPIES_PER_HOUR,
        min_wallet_win_rate: MIN_WALLET_WIN_RATE,
        min_observed_trade_sol: MIN_OBSERVED_TRADE_SOL,
        max_observed_trade_sol: MAX_OBSERVED_TRADE_SOL,
        min_liquidity_usd: MIN_LIQUIDITY_USD,
        loss_cooldown: LOSS_COOLDOWN,
    };
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
