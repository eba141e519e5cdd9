//! Engine event bus: the boundary a UI or notification layer subscribes to.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{MarketQuote, Portfolio, Trade, TraderId, UserId};

/// Everything the engine publishes while processing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An upstream trade from a followed trader entered the pipeline
    Trade(Trade),

    /// A market quote tick was absorbed
    Quote(MarketQuote),

    /// A copy trade filled for a user
    CopyTradeExecuted { user_id: UserId, trade: Trade },

    /// A portfolio changed; carries the full snapshot
    PortfolioUpdated {
        user_id: UserId,
        portfolio: Portfolio,
    },

    /// Follow/unfollow took effect
    FollowChanged {
        user_id: UserId,
        trader_id: TraderId,
        following: bool,
    },
}

/// Broadcast fan-out for engine events. Slow subscribers lag and drop rather
/// than backpressuring the dispatcher.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send with no live subscribers is not an error.
    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
