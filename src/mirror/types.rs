//! Copy-Trade Mirror Types
//!
//! Records for observed wallet events, the persisted mirror configuration,
//! pending trades awaiting approval, and the process-lifetime safety
//! counters.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an observed (and mirrored) trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyAction {
    Buy,
    Sell,
}

impl std::fmt::Display for CopyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyAction::Buy => write!(f, "BUY"),
            CopyAction::Sell => write!(f, "SELL"),
        }
    }
}

/// A smart-money wallet trade as delivered by the observation webhook.
#[derive(Debug, Clone)]
pub struct WalletTradeEvent {
    /// Source wallet address
    pub wallet: String,
    pub action: CopyAction,
    /// Token mint address
    pub mint: String,
    /// Token symbol
    pub symbol: String,
    /// Observed trade size in SOL
    pub amount_sol: f64,
}

/// Persisted mirror configuration.
///
/// Loaded from the config store at startup; absent or unreadable state
/// falls back to these disabled/safe defaults. Every mutation is persisted
/// immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyTradeConfig {
    pub enabled: bool,
    /// Empty = accept any tracked smart-money wallet
    pub whitelist: Vec<String>,
    /// Fraction of the observed size to mirror
    pub size_multiplier: f64,
    /// Skip observed sells entirely
    pub copy_buys_only: bool,
    /// Hold trades for human approval instead of auto-executing
    pub require_approval: bool,
}

impl Default for CopyTradeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            whitelist: Vec::new(),
            size_multiplier: 0.5,
            copy_buys_only: true,
            require_approval: true,
        }
    }
}

/// Partial update applied to [`CopyTradeConfig`]; None fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopyTradeConfigUpdate {
    pub whitelist: Option<Vec<String>>,
    pub size_multiplier: Option<f64>,
    pub copy_buys_only: Option<bool>,
    pub require_approval: Option<bool>,
}

/// Lifecycle of a pending copy trade.
///
/// Terminal states are Executed, Rejected and Expired; Approved only
/// appears transiently while the approved execution is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingStatus {
    Pending,
    Approved,
    Executed,
    Rejected,
    Expired,
}

impl std::fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingStatus::Pending => write!(f, "pending"),
            PendingStatus::Approved => write!(f, "approved"),
            PendingStatus::Executed => write!(f, "executed"),
            PendingStatus::Rejected => write!(f, "rejected"),
            PendingStatus::Expired => write!(f, "expired"),
        }
    }
}

/// A candidate mirror trade awaiting auto-execution or human approval.
#[derive(Debug, Clone)]
pub struct PendingCopyTrade {
    pub id: u64,
    pub wallet: String,
    pub wallet_label: String,
    pub action: CopyAction,
    pub mint: String,
    pub symbol: String,
    /// Size of the observed source trade
    pub observed_amount_sol: f64,
    /// Size we would mirror at, after multiplier and clamps
    pub suggested_amount_sol: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: PendingStatus,
    /// Failure detail for rejected trades
    pub note: Option<String>,
}

impl PendingCopyTrade {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A completed mirror execution, kept for introspection.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub pending_id: u64,
    pub wallet_label: String,
    pub action: CopyAction,
    pub mint: String,
    pub symbol: String,
    /// SOL actually traded; for sells this is the full closed position size
    pub amount_sol: f64,
    pub signature: String,
    /// Realized PnL for sells
    pub realized_pnl_sol: Option<f64>,
    pub executed_at: DateTime<Utc>,
}

/// Webhook-facing verdict for an observed trade.
#[derive(Debug, Clone)]
pub struct CopyDecision {
    pub should_copy: bool,
    pub reason: String,
    pub pending_trade_id: Option<u64>,
}

impl CopyDecision {
    pub fn refuse(reason: impl Into<String>) -> Self {
        Self {
            should_copy: false,
            reason: reason.into(),
            pending_trade_id: None,
        }
    }
}

/// Process-lifetime rate-limit state.
///
/// The hourly counter resets on a fixed interval from the window start,
/// not as a sliding window; simple mechanical rules are the point.
#[derive(Debug, Clone)]
pub struct SafetyCounters {
    pub copies_this_hour: u32,
    pub window_started_at: DateTime<Utc>,
    pub last_copy_at: Option<DateTime<Utc>>,
    pub last_loss_at: Option<DateTime<Utc>>,
}

impl SafetyCounters {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            copies_this_hour: 0,
            window_started_at: now,
            last_copy_at: None,
            last_loss_at: None,
        }
    }

    /// Reset the hourly count when the current window has elapsed.
    pub fn roll_window(&mut self, now: DateTime<Utc>) {
        if now - self.window_started_at >= ChronoDuration::hours(1) {
            self.copies_this_hour = 0;
            self.window_started_at = now;
        }
    }

    pub fn record_execution(&mut self, now: DateTime<Utc>) {
        self.copies_this_hour += 1;
        self.last_copy_at = Some(now);
    }

    pub fn record_loss(&mut self, now: DateTime<Utc>) {
        self.last_loss_at = Some(now);
    }
}

/// Aggregate mirror statistics for the control surface.
#[derive(Debug, Clone)]
pub struct MirrorStats {
    pub enabled: bool,
    pub require_approval: bool,
    pub copies_this_hour: u32,
    pub last_copy_at: Option<DateTime<Utc>>,
    pub last_loss_at: Option<DateTime<Utc>>,
    pub pending_count: usize,
    pub executed_count: usize,
    pub copy_exposure_sol: f64,
}
