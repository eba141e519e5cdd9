//! Strategy-biased trade generation and market-data ticks.
//!
//! One task per seeded trader emits trades at that trader's cadence; a
//! single market-data task refreshes the whole symbol universe. Everything
//! funnels into one channel so the dispatch loop stays a single consumer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::FeedConfig;
use crate::models::{MarketQuote, Trade, TradeSide, TraderProfile, TradingStyle};
use crate::quotes::{synthetic_quote, QuoteCache};

/// Events the feed pushes into the engine.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Trade(Trade),
    Quote(MarketQuote),
}

/// The mock upstream: seeded traders plus market-data ticks.
pub struct TradeFeed {
    config: FeedConfig,
    profiles: Vec<TraderProfile>,
    cache: Arc<QuoteCache>,
}

impl TradeFeed {
    pub fn new(config: FeedConfig, profiles: Vec<TraderProfile>, cache: Arc<QuoteCache>) -> Self {
        Self {
            config,
            profiles,
            cache,
        }
    }

    /// Start all generator tasks. They stop when the receiver is dropped.
    pub fn spawn(self, tx: mpsc::Sender<FeedEvent>) -> Vec<JoinHandle<()>> {
        let universe: BTreeSet<String> = self
            .profiles
            .iter()
            .flat_map(|p| p.preferred_symbols.iter().cloned())
            .collect();

        let mut handles = Vec::with_capacity(self.profiles.len() + 1);

        for profile in self.profiles {
            let tx = tx.clone();
            let cache = self.cache.clone();
            let time_scale = self.config.time_scale;

            handles.push(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(trade_interval(profile.trade_frequency, time_scale)).await;

                    let symbol = pick_symbol(&profile);
                    let price = cache.price(&symbol).await;
                    let trade = build_trade(&profile, &symbol, price);

                    debug!(
                        trader = profile.id,
                        symbol = %trade.symbol,
                        side = trade.side.as_str(),
                        quantity = trade.quantity,
                        "Feed trade generated"
                    );

                    if tx.send(FeedEvent::Trade(trade)).await.is_err() {
                        break;
                    }
                }
            }));
        }

        let quote_interval = scaled(self.config.quote_interval, self.config.time_scale);
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(quote_interval);
            loop {
                ticker.tick().await;
                for symbol in &universe {
                    if tx
                        .send(FeedEvent::Quote(synthetic_quote(symbol)))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }));

        handles
    }
}

/// Time until this trader's next trade: the cadence interval with +/- 20%
/// jitter, compressed by the simulation speed-up.
fn trade_interval(trades_per_hour: f64, time_scale: f64) -> Duration {
    let base_secs = 3600.0 / trades_per_hour.max(0.01);
    let jitter: f64 = rand::thread_rng().gen_range(0.8..1.2);
    Duration::from_secs_f64((base_secs * jitter / time_scale.max(1.0)).max(0.05))
}

fn scaled(interval: Duration, time_scale: f64) -> Duration {
    Duration::from_secs_f64((interval.as_secs_f64() / time_scale.max(1.0)).max(0.05))
}

fn pick_symbol(profile: &TraderProfile) -> String {
    let index = rand::thread_rng().gen_range(0..profile.preferred_symbols.len());
    profile.preferred_symbols[index].clone()
}

/// Buy probability for a style. Momentum flips between strong-buy and
/// strong-sell regimes per trade; Social leans bullish most of the time.
fn buy_bias(style: TradingStyle) -> f64 {
    let mut rng = rand::thread_rng();
    match style {
        TradingStyle::Value => 0.7,
        TradingStyle::Growth => 0.8,
        TradingStyle::Momentum => {
            if rng.gen_bool(0.5) {
                0.8
            } else {
                0.2
            }
        }
        TradingStyle::Meme => rng.gen_range(0.0..1.0),
        TradingStyle::Mixed => 0.5,
        TradingStyle::Social => {
            if rng.gen_bool(0.7) {
                0.65
            } else {
                0.35
            }
        }
        TradingStyle::Etf => 0.9,
    }
}

/// Build a trade for the profile: 75-125% of the trader's average dollar
/// size, converted to whole shares at the current price (at least one).
fn build_trade(profile: &TraderProfile, symbol: &str, price: Decimal) -> Trade {
    let side = if rand::thread_rng().gen::<f64>() < buy_bias(profile.style) {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    };

    let size_factor: f64 = rand::thread_rng().gen_range(0.75..1.25);
    let dollars = profile.avg_size * Decimal::try_from(size_factor).unwrap_or(Decimal::ONE);
    let quantity = if price > Decimal::ZERO {
        (dollars / price).floor().to_u64().unwrap_or(1).max(1)
    } else {
        1
    };

    Trade::new(profile.id, symbol, side, quantity, price)
}
