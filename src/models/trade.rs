//! Canonical trade schema shared by the feed, dispatcher, and ledger.
//!
//! The upstream demo data historically carried aliased field names
//! (`quantity`/`size`, `symbol`/`ticker`, `type`/`action`); this struct is the
//! single schema, and any translation happens in boundary adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

use super::TraderId;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// A single trade: either an upstream event from a followed trader, or an
/// executed fill recorded in a portfolio's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade identifier
    pub id: Uuid,

    /// Trader that originated the trade
    pub trader_id: TraderId,

    /// Instrument symbol (e.g. "AAPL")
    pub symbol: String,

    /// Trade direction
    pub side: TradeSide,

    /// Number of shares; always positive
    pub quantity: u64,

    /// Price per share. For upstream events this is the generator's print;
    /// for executed fills the ledger overwrites it with the resolved price.
    pub price: Decimal,

    /// Realized profit on this fill; zero for buys, set by the ledger on sells
    #[serde(default)]
    pub profit_loss: Decimal,

    /// When the trade occurred
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// Create a well-formed trade stamped with the current time.
    pub fn new(
        trader_id: TraderId,
        symbol: impl Into<String>,
        side: TradeSide,
        quantity: u64,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trader_id,
            symbol: symbol.into(),
            side,
            quantity,
            price,
            profit_loss: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    /// Reject events that violate the schema before they reach any portfolio.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.is_empty() {
            return Err(EngineError::MalformedTrade("empty symbol".to_string()));
        }
        if self.quantity == 0 {
            return Err(EngineError::MalformedTrade(format!(
                "zero quantity for {}",
                self.symbol
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(EngineError::MalformedTrade(format!(
                "non-positive price {} for {}",
                self.price, self.symbol
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_rejects_malformed() {
        let good = Trade::new(1, "AAPL", TradeSide::Buy, 10, dec!(100));
        assert!(good.validate().is_ok());

        let mut zero_qty = good.clone();
        zero_qty.quantity = 0;
        assert!(zero_qty.validate().is_err());

        let mut bad_price = good.clone();
        bad_price.price = dec!(-1);
        assert!(bad_price.validate().is_err());

        let mut no_symbol = good;
        no_symbol.symbol = String::new();
        assert!(no_symbol.validate().is_err());
    }
}
