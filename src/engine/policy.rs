//! Copy policy evaluation: whether a portfolio participates in a source
//! trade, and at what quantity.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Portfolio, PositionSizeType, Trade};

/// Outcome of evaluating one source trade against one portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDecision {
    /// Mirror the trade's symbol and side at this quantity
    Copy { quantity: u64 },
    Skip(SkipReason),
}

/// Why a portfolio sat a trade out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source trader is not in the followed set
    NotFollowing,
    /// No settings for the trader, or copying switched off
    CopyDisabled,
    /// Settings cannot produce a valid size (zero/negative budget or cap)
    InvalidSettings,
    /// Sizing rounded down to nothing
    ZeroQuantity,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotFollowing => "not following",
            SkipReason::CopyDisabled => "copy disabled",
            SkipReason::InvalidSettings => "invalid settings",
            SkipReason::ZeroQuantity => "zero quantity",
        }
    }
}

/// Decide participation and copy quantity for a source trade.
///
/// The copy always mirrors the trade's symbol and side; only the quantity is
/// recomputed from the user's sizing settings. Invalid settings skip this
/// trade only, they do not disable the configuration.
pub fn evaluate(portfolio: &Portfolio, trade: &Trade) -> CopyDecision {
    if !portfolio.is_following(trade.trader_id) {
        return CopyDecision::Skip(SkipReason::NotFollowing);
    }

    let Some(settings) = portfolio.settings_for(trade.trader_id) else {
        return CopyDecision::Skip(SkipReason::CopyDisabled);
    };
    if !settings.enabled {
        return CopyDecision::Skip(SkipReason::CopyDisabled);
    }
    if !settings.is_sizable() {
        return CopyDecision::Skip(SkipReason::InvalidSettings);
    }

    let budget = match settings.position_size_type {
        PositionSizeType::Fixed => settings.position_size,
        PositionSizeType::Percentage => {
            portfolio.cash_balance * settings.position_size / dec!(100)
        }
    };

    let mut quantity = whole_shares(budget, trade.price);

    if Decimal::from(quantity) * trade.price > settings.max_position_size {
        quantity = whole_shares(settings.max_position_size, trade.price);
    }

    if quantity == 0 {
        CopyDecision::Skip(SkipReason::ZeroQuantity)
    } else {
        CopyDecision::Copy { quantity }
    }
}

/// Whole shares purchasable for a dollar budget at a price.
fn whole_shares(budget: Decimal, price: Decimal) -> u64 {
    if price <= Decimal::ZERO {
        return 0;
    }
    (budget / price).floor().to_u64().unwrap_or(0)
}
