//! Recording mocks for all ports.
//!
//! Each mock records the calls it receives and returns controlled
//! responses configured through builder methods. Used by the engine and
//! mirror test suites and the integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::Position;

use super::config_store::{ConfigStore, ConfigStoreError};
use super::execution::{BuyFill, ExecutionError, SellFill, TradeExecutor};
use super::market_data::{MarketDataError, MarketDataPort, TokenSnapshot};
use super::wallet_intel::{WalletIntelError, WalletIntelPort, WalletStats};

/// Mock market data port with per-mint snapshots.
#[derive(Default)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<HashMap<String, TokenSnapshot>>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register a snapshot for a mint
    pub fn with_token(self, snapshot: TokenSnapshot) -> Self {
        self.set_token(snapshot);
        self
    }

    /// Replace the snapshot for a mint
    pub fn set_token(&self, snapshot: TokenSnapshot) {
        self.tokens
            .lock()
            .unwrap()
            .insert(snapshot.mint.clone(), snapshot);
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn get_token(&self, mint: &str) -> Result<Option<TokenSnapshot>, MarketDataError> {
        self.calls.lock().unwrap().push(mint.to_string());
        Ok(self.tokens.lock().unwrap().get(mint).cloned())
    }
}

/// Mock wallet intelligence port with a configurable roster.
#[derive(Default)]
pub struct MockWalletIntel {
    wallets: Arc<Mutex<HashMap<String, WalletStats>>>,
}

impl MockWalletIntel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a tracked wallet with a win rate
    pub fn with_wallet(self, address: &str, label: &str, win_rate: f64) -> Self {
        self.wallets.lock().unwrap().insert(
            address.to_string(),
            WalletStats {
                label: label.to_string(),
                win_rate,
            },
        );
        self
    }
}

#[async_trait]
impl WalletIntelPort for MockWalletIntel {
    async fn is_tracked(&self, address: &str) -> Result<bool, WalletIntelError> {
        Ok(self.wallets.lock().unwrap().contains_key(address))
    }

    async fn get_stats(&self, address: &str) -> Result<Option<WalletStats>, WalletIntelError> {
        Ok(self.wallets.lock().unwrap().get(address).cloned())
    }
}

/// Mock executor that records buys/sells and returns controlled fills.
pub struct MockExecutor {
    buys: Arc<Mutex<Vec<(String, f64)>>>,
    sells: Arc<Mutex<Vec<u64>>>,
    buy_error: Arc<Mutex<Option<String>>>,
    sell_error: Arc<Mutex<Option<String>>>,
    sell_pnl: Arc<Mutex<f64>>,
    fill_price_sol: f64,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self {
            buys: Arc::new(Mutex::new(Vec::new())),
            sells: Arc::new(Mutex::new(Vec::new())),
            buy_error: Arc::new(Mutex::new(None)),
            sell_error: Arc::new(Mutex::new(None)),
            sell_pnl: Arc::new(Mutex::new(0.0)),
            fill_price_sol: 0.001,
        }
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to make every buy fail with the given message
    pub fn with_buy_failure(self, message: &str) -> Self {
        *self.buy_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Builder method to make every sell fail with the given message
    pub fn with_sell_failure(self, message: &str) -> Self {
        *self.sell_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Set the realized PnL returned by subsequent sells
    pub fn set_sell_pnl(&self, pnl_sol: f64) {
        *self.sell_pnl.lock().unwrap() = pnl_sol;
    }

    pub fn buy_calls(&self) -> Vec<(String, f64)> {
        self.buys.lock().unwrap().clone()
    }

    pub fn sell_calls(&self) -> Vec<u64> {
        self.sells.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeExecutor for MockExecutor {
    async fn buy(&self, mint: &str, amount_sol: f64) -> Result<BuyFill, ExecutionError> {
        self.buys
            .lock()
            .unwrap()
            .push((mint.to_string(), amount_sol));

        if let Some(msg) = self.buy_error.lock().unwrap().clone() {
            return Err(ExecutionError::SubmissionFailed(msg));
        }

        let count = self.buys.lock().unwrap().len();
        Ok(BuyFill {
            signature: format!("mock-buy-{count}"),
            token_amount: (amount_sol / self.fill_price_sol * 1e9) as u64,
            price_sol: self.fill_price_sol,
        })
    }

    async fn sell(&self, position: &Position) -> Result<SellFill, ExecutionError> {
        self.sells.lock().unwrap().push(position.id);

        if let Some(msg) = self.sell_error.lock().unwrap().clone() {
            return Err(ExecutionError::SubmissionFailed(msg));
        }

        let pnl = *self.sell_pnl.lock().unwrap();
        let count = self.sells.lock().unwrap().len();
        Ok(SellFill {
            signature: format!("mock-sell-{count}"),
            sol_received: position.amount_sol + pnl,
            realized_pnl_sol: pnl,
        })
    }
}

/// In-memory config store; writes can be forced to fail to exercise the
/// persistence-failure fallback.
#[derive(Default)]
pub struct MockConfigStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MockConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed a stored value
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ConfigStoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<(), ConfigStoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(ConfigStoreError::WriteError("simulated failure".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
