//! Aegis Trader - Autonomous Trading Safety Core
//!
//! A hard-capped autonomous trading core for Solana meme tokens: a
//! mechanical entry/exit engine plus a gated copy-trade mirror, both
//! bounded by a compile-time safety limit table.
//!
//! # Modules
//!
//! - `domain`: Core business types (SafetyLimits, Position, PositionLedger)
//! - `ports`: Trait abstractions (TradeExecutor, MarketDataPort, WalletIntelPort, ConfigStore)
//! - `engine`: Autonomous trading engine (entry gates, fixed sizing, TP/SL exits)
//! - `mirror`: Copy-trade mirror (smart-money gate chain, approval queue)
//! - `config`: Configuration loading and validation

pub mod config;
pub mod domain;
pub mod engine;
pub mod mirror;
pub mod ports;
