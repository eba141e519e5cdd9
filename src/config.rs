//! Engine and feed configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Engine-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Starting cash for every new portfolio
    pub initial_balance: Decimal,

    /// Quote cache entry lifetime
    #[serde(with = "humantime_secs")]
    pub quote_ttl: Duration,

    /// Event bus buffer; slow subscribers lag past this
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(100000),
            quote_ttl: Duration::from_secs(60),
            event_capacity: 256,
        }
    }
}

/// Mock feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Simulation speed-up. 1.0 runs trader cadences in real time; 60.0
    /// compresses an hour of trading into a minute.
    pub time_scale: f64,

    /// Cadence of market-data ticks (before scaling)
    #[serde(with = "humantime_secs")]
    pub quote_interval: Duration,

    /// Buffer between the feed tasks and the dispatch loop
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            time_scale: 60.0,
            quote_interval: Duration::from_secs(120),
            channel_capacity: 64,
        }
    }
}

/// Serialize durations as whole seconds.
mod humantime_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
