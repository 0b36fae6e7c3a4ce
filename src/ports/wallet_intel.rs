//! Wallet Intelligence Port
//!
//! Eligibility and track-record lookup for smart-money wallets. The roster
//! itself is maintained by an external service; the mirror only asks two
//! questions: is this wallet tracked, and how good is it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletIntelError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Track record of a smart-money wallet.
#[derive(Debug, Clone)]
pub struct WalletStats {
    /// Display label, e.g. "Ansem"
    pub label: String,
    /// Historical win rate, 0.0..=1.0
    pub win_rate: f64,
}

#[async_trait]
pub trait WalletIntelPort: Send + Sync {
    /// Whether the address is on the tracked smart-money roster.
    async fn is_tracked(&self, address: &str) -> Result<bool, WalletIntelError>;

    /// Track record for a wallet, or None when unknown.
    async fn get_stats(&self, address: &str) -> Result<Option<WalletStats>, WalletIntelError>;
}
