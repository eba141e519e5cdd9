//! Engine failure taxonomy.
//!
//! Every variant is local to one user's evaluation: the dispatcher logs the
//! failure and moves on to the next portfolio. Quote lookups recover inside
//! the `quotes` module and never surface here.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::UserId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Buy rejected; the portfolio is left unchanged.
    #[error("insufficient funds: trade requires ${required} but only ${available} is available")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Sell rejected, including copy-sells for positions the user never held.
    #[error("insufficient shares of {symbol}: requested {requested}, holding {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    /// Operation addressed a portfolio that was never created.
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    /// Copy settings that cannot produce a valid position size.
    #[error("invalid copy configuration: {0}")]
    InvalidConfiguration(String),

    /// Upstream event that violates the trade schema (zero quantity/price).
    #[error("malformed trade event: {0}")]
    MalformedTrade(String),
}
