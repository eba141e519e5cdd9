//! Trade fan-out: evaluates every portfolio against each upstream trade and
//! executes the resulting copy trades.
//!
//! This is an explicit pipeline stage fed directly from the trade channel.
//! One event is processed to completion across all portfolios before the
//! next; a failure for one user never interrupts the rest.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::models::{MarketQuote, Trade, UserId};
use crate::quotes::QuoteCache;

use super::events::{EngineEvent, EventBus};
use super::ledger::Ledger;
use super::policy::{self, CopyDecision};
use super::store::PortfolioStore;

pub struct Dispatcher {
    store: Arc<PortfolioStore>,
    cache: Arc<QuoteCache>,
    ledger: Ledger,
    bus: EventBus,
}

impl Dispatcher {
    pub fn new(store: Arc<PortfolioStore>, cache: Arc<QuoteCache>, bus: EventBus) -> Self {
        let ledger = Ledger::new(cache.clone());
        Self {
            store,
            cache,
            ledger,
            bus,
        }
    }

    /// Fan an upstream trade out to every portfolio.
    pub async fn dispatch(&self, trade: Trade) {
        if let Err(error) = trade.validate() {
            warn!(error = %error, "Dropping malformed trade event");
            return;
        }

        self.bus.publish(EngineEvent::Trade(trade.clone()));

        for (user_id, handle) in self.store.handles().await {
            let mut portfolio = handle.write().await;

            match policy::evaluate(&portfolio, &trade) {
                CopyDecision::Skip(reason) => {
                    debug!(
                        user = user_id,
                        trader = trade.trader_id,
                        reason = reason.as_str(),
                        "Copy skipped"
                    );
                }
                CopyDecision::Copy { quantity } => {
                    let copy = Trade::new(
                        trade.trader_id,
                        trade.symbol.clone(),
                        trade.side,
                        quantity,
                        trade.price,
                    );

                    match self.ledger.execute(&mut portfolio, &copy).await {
                        Ok(executed) => {
                            info!(
                                user = user_id,
                                trader = trade.trader_id,
                                symbol = %executed.symbol,
                                side = executed.side.as_str(),
                                quantity = executed.quantity,
                                price = %executed.price,
                                "Copy trade executed"
                            );
                            self.bus.publish(EngineEvent::CopyTradeExecuted {
                                user_id,
                                trade: executed,
                            });
                            self.bus.publish(EngineEvent::PortfolioUpdated {
                                user_id,
                                portfolio: portfolio.clone(),
                            });
                        }
                        Err(error) => {
                            // Rejections are reported, not retried
                            warn!(
                                user = user_id,
                                trader = trade.trader_id,
                                symbol = %copy.symbol,
                                error = %error,
                                "Copy trade rejected"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Absorb a market tick: refresh the cache and re-mark any holdings of
    /// that symbol.
    pub async fn absorb_quote(&self, quote: MarketQuote) {
        self.cache.insert(&quote).await;

        for (_, handle) in self.store.handles().await {
            let mut portfolio = handle.write().await;
            if let Some(holding) = portfolio.holdings.get_mut(&quote.symbol) {
                holding.mark(quote.price);
                portfolio.refresh_allocations();
            }
        }

        self.bus.publish(EngineEvent::Quote(quote));
    }

    /// Execute a trade the user placed directly (not a copy), emitting the
    /// updated snapshot on success.
    pub async fn execute_manual(
        &self,
        user_id: UserId,
        trade: Trade,
    ) -> Result<Trade, EngineError> {
        let handle = self
            .store
            .get(user_id)
            .await
            .ok_or(EngineError::UnknownUser(user_id))?;
        let mut portfolio = handle.write().await;

        let executed = self.ledger.execute(&mut portfolio, &trade).await?;
        self.bus.publish(EngineEvent::PortfolioUpdated {
            user_id,
            portfolio: portfolio.clone(),
        });
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use crate::models::{CopySettings, PositionSizeType, TradeSide};
    use crate::quotes::StaticQuoteSource;

    use super::*;

    /// Dispatcher over a fixed-price quote source so fills are deterministic.
    fn fixture() -> (Arc<PortfolioStore>, Dispatcher) {
        let store = Arc::new(PortfolioStore::new(dec!(100000)));
        let source = Arc::new(StaticQuoteSource::new([
            ("AAPL".to_string(), dec!(100)),
            ("NVDA".to_string(), dec!(900)),
        ]));
        let cache = Arc::new(QuoteCache::new(source, Duration::from_secs(60)));
        let dispatcher = Dispatcher::new(store.clone(), cache, EventBus::new(64));
        (store, dispatcher)
    }

    fn fixed_settings(size: rust_decimal::Decimal) -> CopySettings {
        CopySettings {
            position_size_type: PositionSizeType::Fixed,
            position_size: size,
            max_position_size: dec!(100000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_copy_executes_for_configured_follower() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        store
            .update_copy_settings(1, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();

        dispatcher
            .dispatch(Trade::new(7, "AAPL", TradeSide::Buy, 50, dec!(100)))
            .await;

        let snapshot = store.snapshot(1).await.unwrap();
        // floor(1000/100) = 10 shares at the cache price of 100
        assert_eq!(snapshot.holdings["AAPL"].quantity, 10);
        assert_eq!(snapshot.cash_balance, dec!(99000));
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn test_unfollow_stops_subsequent_copies() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        store
            .update_copy_settings(1, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();

        dispatcher
            .dispatch(Trade::new(7, "AAPL", TradeSide::Buy, 50, dec!(100)))
            .await;
        store.unfollow(1, 7).await.unwrap();
        dispatcher
            .dispatch(Trade::new(7, "AAPL", TradeSide::Buy, 50, dec!(100)))
            .await;

        let snapshot = store.snapshot(1).await.unwrap();
        // Only the first trade was copied
        assert_eq!(snapshot.holdings["AAPL"].quantity, 10);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn test_one_users_rejection_does_not_block_others() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        store.create(2).await;
        store
            .update_copy_settings(1, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();
        store
            .update_copy_settings(2, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();

        // User 1 has no NVDA to sell; user 2 holds some
        dispatcher
            .execute_manual(2, Trade::new(0, "NVDA", TradeSide::Buy, 5, dec!(900)))
            .await
            .unwrap();

        dispatcher
            .dispatch(Trade::new(7, "NVDA", TradeSide::Sell, 10, dec!(900)))
            .await;

        let first = store.snapshot(1).await.unwrap();
        let second = store.snapshot(2).await.unwrap();

        // User 1: sell rejected, untouched
        assert!(first.holdings.is_empty());
        assert_eq!(first.cash_balance, dec!(100000));

        // User 2: copy-sell of floor(1000/900)=1 share went through
        assert_eq!(second.holdings["NVDA"].quantity, 4);
    }

    #[tokio::test]
    async fn test_malformed_event_is_dropped() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        store
            .update_copy_settings(1, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();

        let mut bad = Trade::new(7, "AAPL", TradeSide::Buy, 10, dec!(100));
        bad.quantity = 0;
        dispatcher.dispatch(bad).await;

        let snapshot = store.snapshot(1).await.unwrap();
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_copy_events_emitted() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        store
            .update_copy_settings(1, 7, fixed_settings(dec!(1000)))
            .await
            .unwrap();

        let mut rx = dispatcher.bus.subscribe();
        dispatcher
            .dispatch(Trade::new(7, "AAPL", TradeSide::Buy, 50, dec!(100)))
            .await;

        let mut saw_copy = false;
        let mut saw_update = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                EngineEvent::CopyTradeExecuted { user_id, trade } => {
                    assert_eq!(user_id, 1);
                    assert_eq!(trade.quantity, 10);
                    saw_copy = true;
                }
                EngineEvent::PortfolioUpdated { user_id, portfolio } => {
                    assert_eq!(user_id, 1);
                    assert_eq!(portfolio.holdings["AAPL"].quantity, 10);
                    saw_update = true;
                }
                _ => {}
            }
        }
        assert!(saw_copy && saw_update);
    }

    #[tokio::test]
    async fn test_absorb_quote_remarks_holdings() {
        let (store, dispatcher) = fixture();
        store.create(1).await;
        dispatcher
            .execute_manual(1, Trade::new(0, "AAPL", TradeSide::Buy, 10, dec!(100)))
            .await
            .unwrap();

        dispatcher
            .absorb_quote(MarketQuote::of("AAPL", dec!(120)))
            .await;

        let snapshot = store.snapshot(1).await.unwrap();
        let holding = &snapshot.holdings["AAPL"];
        assert_eq!(holding.current_price, dec!(120));
        assert_eq!(holding.unrealized_pnl, dec!(200));
    }

    #[tokio::test]
    async fn test_manual_trade_unknown_user() {
        let (_, dispatcher) = fixture();
        let result = dispatcher
            .execute_manual(42, Trade::new(0, "AAPL", TradeSide::Buy, 1, dec!(100)))
            .await;
        assert!(matches!(result, Err(EngineError::UnknownUser(42))));
    }
}
