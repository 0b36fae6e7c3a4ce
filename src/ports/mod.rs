//! Ports Module
//!
//! Trait abstractions for the external collaborators: transaction
//! submission, market data, wallet intelligence, and the persistent
//! key/value config store. Concrete live adapters are wired by the host
//! process; this crate ships a paper executor, a file store, and
//! recording mocks.

pub mod config_store;
pub mod execution;
pub mod market_data;
pub mod mocks;
pub mod wallet_intel;

pub use config_store::{ConfigStore, ConfigStoreError, FileConfigStore};
pub use execution::{BuyFill, ExecutionError, PaperExecutor, SellFill, TradeExecutor};
pub use market_data::{MarketDataError, MarketDataPort, TokenSnapshot};
pub use wallet_intel::{WalletIntelError, WalletIntelPort, WalletStats};
