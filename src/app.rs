//! Application context: owns the engine pieces and wires the feed into the
//! dispatch loop.
//!
//! The portfolio store, quote cache, and event bus all live here; there is
//! no ambient global state. Anything that needs them gets a handle from the
//! context.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::config::{EngineConfig, FeedConfig};
use crate::engine::{Dispatcher, EngineEvent, EventBus, PortfolioStore};
use crate::error::EngineError;
use crate::feed::{seed_profiles, FeedEvent, TradeFeed};
use crate::models::{CopySettings, MarketQuote, Portfolio, Trade, TraderId, UserId};
use crate::quotes::{QuoteCache, QuoteSource};

pub struct App {
    store: Arc<PortfolioStore>,
    cache: Arc<QuoteCache>,
    bus: EventBus,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(config: EngineConfig, source: Arc<dyn QuoteSource>) -> Self {
        let store = Arc::new(PortfolioStore::new(config.initial_balance));
        let cache = Arc::new(QuoteCache::new(source, config.quote_ttl));
        let bus = EventBus::new(config.event_capacity);
        let dispatcher = Dispatcher::new(store.clone(), cache.clone(), bus.clone());

        Self {
            store,
            cache,
            bus,
            dispatcher,
        }
    }

    /// Subscribe to engine events (the UI/notification boundary).
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Start a user session: create the portfolio and emit its first
    /// snapshot.
    pub async fn create_user(&self, user_id: UserId) -> Portfolio {
        let handle = self.store.create(user_id).await;
        let portfolio = handle.read().await.clone();
        self.bus.publish(EngineEvent::PortfolioUpdated {
            user_id,
            portfolio: portfolio.clone(),
        });
        portfolio
    }

    pub async fn follow(&self, user_id: UserId, trader_id: TraderId) -> Result<bool, EngineError> {
        let changed = self.store.follow(user_id, trader_id).await?;
        if changed {
            self.bus.publish(EngineEvent::FollowChanged {
                user_id,
                trader_id,
                following: true,
            });
        }
        Ok(changed)
    }

    pub async fn unfollow(
        &self,
        user_id: UserId,
        trader_id: TraderId,
    ) -> Result<bool, EngineError> {
        let removed = self.store.unfollow(user_id, trader_id).await?;
        if removed {
            self.bus.publish(EngineEvent::FollowChanged {
                user_id,
                trader_id,
                following: false,
            });
        }
        Ok(removed)
    }

    pub async fn set_copy_settings(
        &self,
        user_id: UserId,
        trader_id: TraderId,
        settings: CopySettings,
    ) -> Result<(), EngineError> {
        self.store
            .update_copy_settings(user_id, trader_id, settings)
            .await?;
        let snapshot = self.store.snapshot(user_id).await?;
        self.bus.publish(EngineEvent::PortfolioUpdated {
            user_id,
            portfolio: snapshot,
        });
        Ok(())
    }

    /// Execute a trade the user placed directly against their own portfolio.
    pub async fn execute_manual_trade(
        &self,
        user_id: UserId,
        trade: Trade,
    ) -> Result<Trade, EngineError> {
        self.dispatcher.execute_manual(user_id, trade).await
    }

    /// Push an upstream trade through the full copy pipeline. The feed uses
    /// this path; so can any other producer.
    pub async fn inject_trade(&self, trade: Trade) {
        self.dispatcher.dispatch(trade).await;
    }

    /// Push a market tick into the cache and re-mark affected holdings.
    pub async fn inject_quote(&self, quote: MarketQuote) {
        self.dispatcher.absorb_quote(quote).await;
    }

    /// Refresh every portfolio at current cache prices and emit snapshots.
    pub async fn mark_to_market(&self) {
        self.store.mark_to_market(&self.cache).await;
        for (user_id, handle) in self.store.handles().await {
            let portfolio = handle.read().await;
            self.bus.publish(EngineEvent::PortfolioUpdated {
                user_id,
                portfolio: portfolio.clone(),
            });
        }
    }

    pub async fn portfolio(&self, user_id: UserId) -> Result<Portfolio, EngineError> {
        self.store.snapshot(user_id).await
    }

    /// Run the live simulation: spawn the mock feed and drain it into the
    /// dispatcher until Ctrl+C. Each event is handled to completion before
    /// the next is taken.
    pub async fn run(&self, feed_config: FeedConfig) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(feed_config.channel_capacity);
        let feed = TradeFeed::new(feed_config, seed_profiles(), self.cache.clone());
        let handles = feed.spawn(tx);

        info!("Engine running; press Ctrl+C to stop");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                event = rx.recv() => match event {
                    Some(FeedEvent::Trade(trade)) => self.dispatcher.dispatch(trade).await,
                    Some(FeedEvent::Quote(quote)) => self.dispatcher.absorb_quote(quote).await,
                    None => break,
                },
            }
        }

        for handle in handles {
            handle.abort();
        }

        Ok(())
    }
}
