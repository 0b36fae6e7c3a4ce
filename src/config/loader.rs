//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. The hard safety caps live in `domain::limits` and are not
//! configurable here; this file covers the tunables the operator may set
//! (trade size, exit thresholds, mirror sizing bounds, storage, logging).

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::limits;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineSection,
    pub mirror: MirrorSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

/// Autonomous engine configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Fixed SOL committed per entry (mechanical sizing, never
    /// signal-weighted)
    pub trade_size_sol: f64,
    /// Exit when current price reaches this multiple of entry (2.0 = 2x)
    pub take_profit_multiple: f64,
    /// Exit when unrealized loss reaches this percentage (30.0 = -30%)
    pub stop_loss_pct: f64,
    /// Reject entries when market cap / liquidity exceeds this ratio
    pub max_mcap_liquidity_ratio: f64,
    /// Reject entries when the 1h buy/sell ratio is at or below this
    pub min_buy_sell_ratio: f64,
    /// Seconds between open-position exit checks
    pub exit_check_interval_secs: u64,
}

/// Copy-trade mirror configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorSection {
    /// Lowest accepted size multiplier
    pub min_size_multiplier: f64,
    /// Highest accepted size multiplier
    pub max_size_multiplier: f64,
}

/// Storage configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Path of the JSON key/value store (supports ~)
    pub store_path: String,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.trade_size_sol <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "trade_size_sol must be > 0, got {}",
                self.engine.trade_size_sol
            )));
        }

        if self.engine.trade_size_sol > limits::MAX_TRADE_SOL {
            return Err(ConfigError::ValidationError(format!(
                "trade_size_sol must not exceed the single-trade cap of {} SOL, got {}",
                limits::MAX_TRADE_SOL,
                self.engine.trade_size_sol
            )));
        }

        if self.engine.take_profit_multiple <= 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "take_profit_multiple must be > 1.0, got {}",
                self.engine.take_profit_multiple
            )));
        }

        if self.engine.stop_loss_pct <= 0.0 || self.engine.stop_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "stop_loss_pct must be 0-100, got {}",
                self.engine.stop_loss_pct
            )));
        }

        if self.engine.max_mcap_liquidity_ratio <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_mcap_liquidity_ratio must be > 0, got {}",
                self.engine.max_mcap_liquidity_ratio
            )));
        }

        if self.engine.min_buy_sell_ratio < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_buy_sell_ratio must be >= 1.0 (neutral), got {}",
                self.engine.min_buy_sell_ratio
            )));
        }

        if self.engine.exit_check_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "exit_check_interval_secs must be > 0".to_string(),
            ));
        }

        if self.mirror.min_size_multiplier <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_size_multiplier must be > 0, got {}",
                self.mirror.min_size_multiplier
            )));
        }

        if self.mirror.max_size_multiplier > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_size_multiplier must not exceed 1.0, got {}",
                self.mirror.max_size_multiplier
            )));
        }

        if self.mirror.min_size_multiplier > self.mirror.max_size_multiplier {
            return Err(ConfigError::ValidationError(format!(
                "min_size_multiplier {} exceeds max_size_multiplier {}",
                self.mirror.min_size_multiplier, self.mirror.max_size_multiplier
            )));
        }

        if self.storage.store_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "store_path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            trade_size_sol: 0.25,
            take_profit_multiple: 2.0,
            stop_loss_pct: 30.0,
            max_mcap_liquidity_ratio: 20.0,
            min_buy_sell_ratio: 1.0,
            exit_check_interval_secs: 30,
        }
    }
}

impl Default for MirrorSection {
    fn default() -> Self {
        Self {
            min_size_multiplier: 0.01,
            max_size_multiplier: 1.0,
        }
    }
}
