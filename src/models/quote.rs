//! Market quote model shared by the quote client, cache, and feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time price observation for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Absolute change since previous close
    #[serde(default)]
    pub change: Decimal,

    /// Percent change since previous close
    #[serde(default)]
    pub change_percent: Decimal,

    #[serde(default)]
    pub volume: u64,

    pub timestamp: DateTime<Utc>,
}

impl MarketQuote {
    /// Build a bare quote carrying only a price.
    pub fn of(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            volume: 0,
            timestamp: Utc::now(),
        }
    }
}
