//! Domain Module
//!
//! Pure business types: the constant safety-limit table, position records,
//! and the open-position ledger.

pub mod ledger;
pub mod limits;
pub mod position;

pub use ledger::{OpenPosition, PositionLedger};
pub use limits::SafetyLimits;
pub use position::{Position, PositionStatus, TradeOrigin};
