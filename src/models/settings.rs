//! Per-trader copy-trading configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How the copy quantity is derived from a source trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSizeType {
    /// `position_size` is a dollar budget per copied trade
    Fixed,
    /// `position_size` is a percent of the portfolio's cash balance
    Percentage,
}

/// Copy settings for one (user, trader) pair.
///
/// Only `enabled`, `position_size_type`, `position_size`, and
/// `max_position_size` drive the evaluator. The remaining risk fields are
/// carried for the settings UI but not enforced when sizing copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySettings {
    /// Master switch; force-cleared when the trader is unfollowed
    pub enabled: bool,

    /// Sizing mode
    pub position_size_type: PositionSizeType,

    /// Dollar amount or percent, depending on `position_size_type`
    pub position_size: Decimal,

    /// Hard dollar cap per copied position
    pub max_position_size: Decimal,

    /// Carried; not evaluated
    #[serde(default)]
    pub stop_loss_percent: Option<Decimal>,

    /// Carried; not evaluated
    #[serde(default)]
    pub take_profit_percent: Option<Decimal>,

    /// Carried; not evaluated
    #[serde(default)]
    pub max_daily_loss: Option<Decimal>,

    /// Carried; not evaluated
    #[serde(default)]
    pub max_drawdown_percent: Option<Decimal>,
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            position_size_type: PositionSizeType::Fixed,
            position_size: dec!(1000),
            max_position_size: dec!(5000),
            stop_loss_percent: None,
            take_profit_percent: None,
            max_daily_loss: None,
            max_drawdown_percent: None,
        }
    }
}

impl CopySettings {
    /// Check that the enforced fields can produce a valid copy quantity.
    ///
    /// Carried risk fields are sign-checked when present so the settings
    /// store never holds obviously nonsensical values.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.position_size <= Decimal::ZERO {
            return Err(EngineError::InvalidConfiguration(format!(
                "position_size must be positive, got {}",
                self.position_size
            )));
        }
        if self.max_position_size <= Decimal::ZERO {
            return Err(EngineError::InvalidConfiguration(format!(
                "max_position_size must be positive, got {}",
                self.max_position_size
            )));
        }
        for (name, value) in [
            ("stop_loss_percent", self.stop_loss_percent),
            ("take_profit_percent", self.take_profit_percent),
            ("max_daily_loss", self.max_daily_loss),
            ("max_drawdown_percent", self.max_drawdown_percent),
        ] {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "{name} must not be negative, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// True when the evaluator can size copies from these settings.
    pub fn is_sizable(&self) -> bool {
        self.position_size > Decimal::ZERO && self.max_position_size > Decimal::ZERO
    }
}
