//! Trader profile model: the leaderboard entries the mock feed trades for.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TraderId;

/// Broad risk bucket shown on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Trading style driving the feed's buy/sell bias for this trader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingStyle {
    Value,
    Growth,
    Momentum,
    Meme,
    Mixed,
    Social,
    Etf,
}

impl TradingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingStyle::Value => "Value",
            TradingStyle::Growth => "Growth",
            TradingStyle::Momentum => "Momentum",
            TradingStyle::Meme => "Meme",
            TradingStyle::Mixed => "Mixed",
            TradingStyle::Social => "Social",
            TradingStyle::Etf => "ETF",
        }
    }
}

/// A followable trader as seeded into the demo platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderProfile {
    pub id: TraderId,

    /// Display handle
    pub name: String,

    /// Avatar URL for the dashboard
    pub avatar: String,

    pub followers: u32,

    /// Trailing 30-day return, percent
    pub return_30d: Decimal,

    /// Historical win rate, percent
    pub win_rate: Decimal,

    pub risk_level: RiskLevel,

    pub sharpe_ratio: Decimal,

    pub style: TradingStyle,

    /// Trades per hour the feed generates for this trader
    pub trade_frequency: f64,

    /// Average dollar size per position
    pub avg_size: Decimal,

    /// Symbols this trader actually trades
    pub preferred_symbols: Vec<String>,

    pub description: String,
}
