//! Short-TTL price cache over a `QuoteSource`.
//!
//! `price` never fails and never blocks past the source's own timeout: on a
//! refresh failure the synthetic pricer substitutes and the miss is logged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::MarketQuote;

use super::client::{synthetic_quote, QuoteSource};

struct CacheEntry {
    price: Decimal,
    fetched_at: Instant,
}

/// Last-known price per symbol with expiry.
pub struct QuoteCache {
    source: Arc<dyn QuoteSource>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QuoteCache {
    pub fn new(source: Arc<dyn QuoteSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Current price for a symbol.
    ///
    /// Serves from cache while fresh, refreshes through the source otherwise,
    /// and substitutes a synthetic price if the refresh fails. Fetches happen
    /// outside the write lock so concurrent lookups for other symbols are
    /// never held up.
    pub async fn price(&self, symbol: &str) -> Decimal {
        if let Some(price) = self.fresh(symbol).await {
            return price;
        }

        match self.source.fetch(symbol).await {
            Ok(quote) => {
                self.insert(&quote).await;
                quote.price
            }
            Err(error) => {
                warn!(symbol = symbol, error = %error, "Quote refresh failed, using synthetic price");
                synthetic_quote(symbol).price
            }
        }
    }

    /// Cached price if the entry is still within TTL.
    async fn fresh(&self, symbol: &str) -> Option<Decimal> {
        let entries = self.entries.read().await;
        let entry = entries.get(symbol)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.price)
        } else {
            debug!(symbol = symbol, "Cache entry expired");
            None
        }
    }

    /// Store a quote, stamping it as freshly fetched. Also the path the
    /// dispatcher uses to absorb feed ticks.
    pub async fn insert(&self, quote: &MarketQuote) {
        let mut entries = self.entries.write().await;
        entries.insert(
            quote.symbol.clone(),
            CacheEntry {
                price: quote.price,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use crate::models::MarketQuote;

    use super::*;

    /// Source that counts fetches and can be told to fail.
    struct CountingSource {
        fetches: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl QuoteSource for CountingSource {
        async fn fetch(&self, symbol: &str) -> Result<MarketQuote> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("source down");
            }
            Ok(MarketQuote::of(symbol, dec!(42)))
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_refetch() {
        let source = Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            fail: false,
        });
        let cache = QuoteCache::new(source.clone(), Duration::from_secs(60));

        assert_eq!(cache.price("AAPL").await, dec!(42));
        assert_eq!(cache.price("AAPL").await, dec!(42));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let source = Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            fail: false,
        });
        let cache = QuoteCache::new(source.clone(), Duration::from_millis(10));

        cache.price("AAPL").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.price("AAPL").await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_synthetic() {
        let source = Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            fail: true,
        });
        let cache = QuoteCache::new(source, Duration::from_secs(60));

        // AAPL base is 180; synthetic jitter is bounded to +/- 5%
        let price = cache.price("AAPL").await;
        assert!(price >= dec!(171.00) && price <= dec!(189.00));
    }

    #[tokio::test]
    async fn test_inserted_tick_is_served() {
        let source = Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            fail: true,
        });
        let cache = QuoteCache::new(source.clone(), Duration::from_secs(60));

        cache.insert(&MarketQuote::of("NVDA", dec!(910))).await;
        assert_eq!(cache.price("NVDA").await, dec!(910));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
