//! Market Data Port
//!
//! Contract for the liquidity/price lookup the excluded market-data
//! aggregator implements. The core only needs one snapshot shape.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Point-in-time view of a token's market state.
#[derive(Debug, Clone)]
pub struct TokenSnapshot {
    /// Token mint address
    pub mint: String,
    /// Token symbol
    pub symbol: String,
    /// Current price in SOL per token
    pub price_sol: f64,
    /// Market cap in USD
    pub market_cap_usd: f64,
    /// Estimated pool liquidity in USD
    pub liquidity_usd: f64,
    /// Buy transactions over the trailing hour
    pub buys_1h: u32,
    /// Sell transactions over the trailing hour
    pub sells_1h: u32,
}

impl TokenSnapshot {
    /// Buy pressure over the trailing window; 1.0 is neutral.
    pub fn buy_sell_ratio(&self) -> f64 {
        if self.sells_1h == 0 {
            // No sells at all reads as maximal buy pressure
            return f64::INFINITY;
        }
        self.buys_1h as f64 / self.sells_1h as f64
    }

    /// Market-cap to liquidity ratio; high values indicate a fragile pool.
    pub fn mcap_liquidity_ratio(&self) -> f64 {
        if self.liquidity_usd <= 0.0 {
            return f64::INFINITY;
        }
        self.market_cap_usd / self.liquidity_usd
    }
}

#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch the current snapshot for a mint, or None if the token is
    /// unknown to the aggregator.
    async fn get_token(&self, mint: &str) -> Result<Option<TokenSnapshot>, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(buys: u32, sells: u32, mcap: f64, liq: f64) -> TokenSnapshot {
        TokenSnapshot {
            mint: "mint".to_string(),
            symbol: "TEST".to_string(),
            price_sol: 0.001,
            market_cap_usd: mcap,
            liquidity_usd: liq,
            buys_1h: buys,
            sells_1h: sells,
        }
    }

    #[test]
    fn test_buy_sell_ratio() {
        assert!((snapshot(30, 10, 0.0, 1.0).buy_sell_ratio() - 3.0).abs() < 1e-9);
        assert_eq!(snapshot(5, 0, 0.0, 1.0).buy_sell_ratio(), f64::INFINITY);
    }

    #[test]
    fn test_mcap_liquidity_ratio() {
        assert!((snapshot(0, 0, 500_000.0, 50_000.0).mcap_liquidity_ratio() - 10.0).abs() < 1e-9);
        assert_eq!(snapshot(0, 0, 1.0, 0.0).mcap_liquidity_ratio(), f64::INFINITY);
    }
}
