//! Portfolio store and follow/settings registry.
//!
//! The store is an explicit, injected object owned by the application
//! context; each portfolio sits behind its own lock so writes to different
//! users never contend and writes to one user never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::EngineError;
use crate::models::{CopySettings, Portfolio, TraderId, UserId};
use crate::quotes::QuoteCache;

/// Shared handle to one user's portfolio.
pub type PortfolioHandle = Arc<RwLock<Portfolio>>;

/// All live portfolios, keyed by user.
pub struct PortfolioStore {
    portfolios: RwLock<HashMap<UserId, PortfolioHandle>>,
    initial_balance: Decimal,
}

impl PortfolioStore {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            portfolios: RwLock::new(HashMap::new()),
            initial_balance,
        }
    }

    /// Create a portfolio for a new user session, or return the existing one.
    pub async fn create(&self, user_id: UserId) -> PortfolioHandle {
        let mut portfolios = self.portfolios.write().await;
        portfolios
            .entry(user_id)
            .or_insert_with(|| {
                info!(user = user_id, balance = %self.initial_balance, "Portfolio created");
                Arc::new(RwLock::new(Portfolio::new(user_id, self.initial_balance)))
            })
            .clone()
    }

    pub async fn get(&self, user_id: UserId) -> Option<PortfolioHandle> {
        let portfolios = self.portfolios.read().await;
        portfolios.get(&user_id).cloned()
    }

    /// Handles for every portfolio; the store lock is released before any
    /// portfolio lock is taken.
    pub async fn handles(&self) -> Vec<(UserId, PortfolioHandle)> {
        let portfolios = self.portfolios.read().await;
        portfolios.iter().map(|(id, h)| (*id, h.clone())).collect()
    }

    /// Point-in-time copy of one portfolio.
    pub async fn snapshot(&self, user_id: UserId) -> Result<Portfolio, EngineError> {
        let handle = self
            .get(user_id)
            .await
            .ok_or(EngineError::UnknownUser(user_id))?;
        let portfolio = handle.read().await;
        Ok(portfolio.clone())
    }

    /// Add a trader to the user's followed set.
    ///
    /// Idempotent; `Ok(true)` iff the set changed.
    pub async fn follow(&self, user_id: UserId, trader_id: TraderId) -> Result<bool, EngineError> {
        let handle = self
            .get(user_id)
            .await
            .ok_or(EngineError::UnknownUser(user_id))?;
        let mut portfolio = handle.write().await;
        let changed = portfolio.followed.insert(trader_id);
        if changed {
            info!(user = user_id, trader = trader_id, "Now following");
        }
        Ok(changed)
    }

    /// Remove a trader from the followed set and force-disable any existing
    /// copy settings, so copying stops on the very next trade.
    pub async fn unfollow(
        &self,
        user_id: UserId,
        trader_id: TraderId,
    ) -> Result<bool, EngineError> {
        let handle = self
            .get(user_id)
            .await
            .ok_or(EngineError::UnknownUser(user_id))?;
        let mut portfolio = handle.write().await;
        let removed = portfolio.followed.remove(&trader_id);
        if let Some(settings) = portfolio.copy_settings.get_mut(&trader_id) {
            settings.enabled = false;
        }
        if removed {
            info!(user = user_id, trader = trader_id, "Unfollowed");
        }
        Ok(removed)
    }

    /// Upsert copy settings for a (user, trader) pair. Configuring copy
    /// trading implies following, so the trader is added to the followed set.
    pub async fn update_copy_settings(
        &self,
        user_id: UserId,
        trader_id: TraderId,
        settings: CopySettings,
    ) -> Result<(), EngineError> {
        settings.validate()?;
        let handle = self
            .get(user_id)
            .await
            .ok_or(EngineError::UnknownUser(user_id))?;
        let mut portfolio = handle.write().await;
        portfolio.followed.insert(trader_id);
        portfolio.copy_settings.insert(trader_id, settings);
        info!(user = user_id, trader = trader_id, "Copy settings updated");
        Ok(())
    }

    /// Re-mark every holding of every portfolio at cache prices and refresh
    /// allocations.
    pub async fn mark_to_market(&self, cache: &QuoteCache) {
        for (_, handle) in self.handles().await {
            let mut portfolio = handle.write().await;
            let symbols: Vec<String> = portfolio.holdings.keys().cloned().collect();
            for symbol in symbols {
                let price = cache.price(&symbol).await;
                if let Some(holding) = portfolio.holdings.get_mut(&symbol) {
                    holding.mark(price);
                }
            }
            portfolio.refresh_allocations();
        }
    }
}
