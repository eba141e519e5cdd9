//! Portfolio and holding models: the state the ledger mutates.

use std::collections::{HashMap, HashSet, VecDeque};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{CopySettings, Trade, TraderId, UserId};

/// An open position in one symbol.
///
/// Present in a portfolio only while `quantity > 0`; the ledger removes the
/// entry entirely when a sell closes the position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Instrument symbol; also the key in the portfolio's holdings map
    pub symbol: String,

    /// Shares held
    pub quantity: u64,

    /// Cost basis per share (quantity-weighted across buys)
    pub average_price: Decimal,

    /// Last price the holding was marked at
    pub current_price: Decimal,

    /// quantity x current_price
    pub current_value: Decimal,

    /// Cumulative cost basis
    pub total_cost: Decimal,

    /// current_value - total_cost
    pub unrealized_pnl: Decimal,

    /// Share of total portfolio value (cash + holdings), 0-100
    pub allocation_percent: Decimal,
}

impl Holding {
    /// Open a new holding from the first fill.
    pub fn open(symbol: impl Into<String>, quantity: u64, price: Decimal) -> Self {
        let cost = price * Decimal::from(quantity);
        Self {
            symbol: symbol.into(),
            quantity,
            average_price: price,
            current_price: price,
            current_value: cost,
            total_cost: cost,
            unrealized_pnl: Decimal::ZERO,
            allocation_percent: Decimal::ZERO,
        }
    }

    /// Re-mark the holding at a new price, refreshing value and open P&L.
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.current_value = price * Decimal::from(self.quantity);
        self.unrealized_pnl = self.current_value - self.total_cost;
    }
}

/// One user's in-memory portfolio. Created on session start, lives for the
/// process lifetime, and is only ever mutated under its own lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// Owning user
    pub user_id: UserId,

    /// Uninvested cash; never driven negative by a fill
    pub cash_balance: Decimal,

    /// Open positions keyed by symbol
    pub holdings: HashMap<String, Holding>,

    /// Executed trades, newest first
    pub history: VecDeque<Trade>,

    /// Cumulative profit locked in by sells
    pub realized_pnl: Decimal,

    /// Traders whose trades this portfolio may copy
    pub followed: HashSet<TraderId>,

    /// Copy configuration per followed trader
    pub copy_settings: HashMap<TraderId, CopySettings>,
}

impl Portfolio {
    /// Create an empty portfolio with the given starting cash.
    pub fn new(user_id: UserId, initial_balance: Decimal) -> Self {
        Self {
            user_id,
            cash_balance: initial_balance,
            holdings: HashMap::new(),
            history: VecDeque::new(),
            realized_pnl: Decimal::ZERO,
            followed: HashSet::new(),
            copy_settings: HashMap::new(),
        }
    }

    /// Market value of all open positions.
    pub fn holdings_value(&self) -> Decimal {
        self.holdings.values().map(|h| h.current_value).sum()
    }

    /// Total portfolio value: cash plus holdings.
    pub fn total_value(&self) -> Decimal {
        self.cash_balance + self.holdings_value()
    }

    /// Mark-to-market P&L across all open positions.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.holdings.values().map(|h| h.unrealized_pnl).sum()
    }

    /// Recompute every holding's allocation against the current total value.
    /// Called after any fill or re-mark since the denominator moves too.
    pub fn refresh_allocations(&mut self) {
        let total = self.total_value();
        for holding in self.holdings.values_mut() {
            holding.allocation_percent = if total > Decimal::ZERO {
                holding.current_value / total * dec!(100)
            } else {
                Decimal::ZERO
            };
        }
    }

    pub fn is_following(&self, trader_id: TraderId) -> bool {
        self.followed.contains(&trader_id)
    }

    pub fn settings_for(&self, trader_id: TraderId) -> Option<&CopySettings> {
        self.copy_settings.get(&trader_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_open_and_mark() {
        let mut holding = Holding::open("AAPL", 10, dec!(180));
        assert_eq!(holding.total_cost, dec!(1800));
        assert_eq!(holding.unrealized_pnl, dec!(0));

        holding.mark(dec!(200));
        assert_eq!(holding.current_value, dec!(2000));
        assert_eq!(holding.unrealized_pnl, dec!(200));
        // Cost basis is untouched by a re-mark
        assert_eq!(holding.average_price, dec!(180));
        assert_eq!(holding.total_cost, dec!(1800));
    }

    #[test]
    fn test_allocations_sum_with_cash_remainder() {
        let mut portfolio = Portfolio::new(1, dec!(5000));
        portfolio
            .holdings
            .insert("AAPL".to_string(), Holding::open("AAPL", 10, dec!(100)));
        portfolio
            .holdings
            .insert("MSFT".to_string(), Holding::open("MSFT", 10, dec!(400)));
        portfolio.refresh_allocations();

        // Total value: 5000 cash + 1000 + 4000 = 10000
        let total_allocation: Decimal = portfolio
            .holdings
            .values()
            .map(|h| h.allocation_percent)
            .sum();
        assert_eq!(
            portfolio.holdings["AAPL"].allocation_percent,
            dec!(10)
        );
        assert_eq!(
            portfolio.holdings["MSFT"].allocation_percent,
            dec!(40)
        );
        assert!(total_allocation <= dec!(100));
    }

    #[test]
    fn test_empty_portfolio_allocation_refresh_is_safe() {
        let mut portfolio = Portfolio::new(1, Decimal::ZERO);
        // No holdings and zero cash: must not divide by zero
        portfolio.refresh_allocations();
        assert_eq!(portfolio.total_value(), Decimal::ZERO);
    }
}
