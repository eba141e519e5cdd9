//! Quote providers: an HTTP client for GLOBAL_QUOTE-style endpoints and the
//! synthetic pricer used whenever live data is unavailable.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::models::MarketQuote;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base prices for the demo universe. Unknown symbols fall back to 100.
const BASE_PRICES: &[(&str, u32)] = &[
    ("AAPL", 180),
    ("MSFT", 390),
    ("GOOGL", 150),
    ("AMZN", 170),
    ("META", 480),
    ("TSLA", 180),
    ("NVDA", 900),
    ("AMD", 160),
    ("DIS", 110),
    ("NFLX", 600),
    ("SPY", 500),
    ("QQQ", 440),
    ("VTI", 260),
    ("ARKK", 45),
    ("XLK", 210),
    ("XLF", 42),
    ("GME", 20),
    ("AMC", 5),
    ("PLTR", 25),
    ("SOFI", 8),
    ("HOOD", 15),
    ("COIN", 250),
    ("SQ", 80),
    ("KO", 60),
    ("JNJ", 155),
    ("PG", 165),
    ("ROKU", 65),
    ("SBUX", 95),
];

/// Reference price for a symbol, from the base table.
pub fn base_price(symbol: &str) -> Decimal {
    BASE_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| Decimal::from(*p))
        .unwrap_or(dec!(100))
}

/// Synthesize a quote from the base table with bounded jitter (+/- 5%).
/// Used when the live source fails; never errors.
pub fn synthetic_quote(symbol: &str) -> MarketQuote {
    let base = base_price(symbol);
    let variation: f64 = rand::thread_rng().gen_range(-0.05..0.05);
    let factor = Decimal::try_from(1.0 + variation).unwrap_or(Decimal::ONE);
    let price = (base * factor).round_dp(2);

    MarketQuote {
        symbol: symbol.to_string(),
        price,
        change: (price - base).round_dp(2),
        change_percent: Decimal::try_from(variation * 100.0)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2),
        volume: rand::thread_rng().gen_range(100_000..10_000_000),
        timestamp: Utc::now(),
    }
}

/// A price provider. The cache composes over any implementation.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<MarketQuote>;
}

/// HTTP quote source speaking the Alpha Vantage GLOBAL_QUOTE shape.
pub struct HttpQuoteSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpQuoteSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self, symbol: &str) -> Result<MarketQuote> {
        let url = format!(
            "{}/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );

        debug!(symbol = symbol, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Quote request failed for {symbol}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Quote endpoint returned {} for {symbol}", response.status());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Invalid quote payload for {symbol}"))?;

        // Rate-limited or unknown symbols come back 200 with an empty object
        let quote = body
            .get("Global Quote")
            .and_then(|q| q.as_object())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| anyhow::anyhow!("No quote data for {symbol}"))?;

        let field = |key: &str| -> Option<Decimal> {
            quote
                .get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| s.trim_end_matches('%').parse().ok())
        };

        let price = field("05. price")
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| anyhow::anyhow!("Missing price for {symbol}"))?;

        Ok(MarketQuote {
            symbol: symbol.to_string(),
            price,
            change: field("09. change").unwrap_or(Decimal::ZERO),
            change_percent: field("10. change percent").unwrap_or(Decimal::ZERO),
            volume: quote
                .get("06. volume")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            timestamp: Utc::now(),
        })
    }
}

/// Source producing synthetic quotes only. Default when no API key is set.
pub struct SyntheticQuoteSource;

#[async_trait]
impl QuoteSource for SyntheticQuoteSource {
    async fn fetch(&self, symbol: &str) -> Result<MarketQuote> {
        Ok(synthetic_quote(symbol))
    }
}

/// Fixed-price source for deterministic sessions and tests.
pub struct StaticQuoteSource {
    prices: HashMap<String, Decimal>,
}

impl StaticQuoteSource {
    pub fn new(prices: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
        }
    }

    /// Every symbol priced exactly at its base-table value.
    pub fn from_base_table() -> Self {
        Self {
            prices: BASE_PRICES
                .iter()
                .map(|(s, p)| (s.to_string(), Decimal::from(*p)))
                .collect(),
        }
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn fetch(&self, symbol: &str) -> Result<MarketQuote> {
        let price = self.prices.get(symbol).copied().unwrap_or_else(|| base_price(symbol));
        Ok(MarketQuote::of(symbol, price))
    }
}
