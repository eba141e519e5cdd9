//! Portfolio ledger: applies buy/sell fills against a portfolio while
//! keeping cash, cost basis, and P&L consistent.
//!
//! A fill executes at the market price resolved through the quote cache, not
//! necessarily at the source trade's print; the gap models slippage between
//! the original trade and the copy.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineError;
use crate::models::{Holding, Portfolio, Trade, TradeSide};
use crate::quotes::QuoteCache;

/// Executes fills with prices resolved through the quote cache.
pub struct Ledger {
    cache: Arc<QuoteCache>,
}

impl Ledger {
    pub fn new(cache: Arc<QuoteCache>) -> Self {
        Self { cache }
    }

    /// Execute a trade against a portfolio at the current market price.
    ///
    /// Rejections (`InsufficientFunds`, `InsufficientShares`, malformed
    /// events) leave the portfolio exactly as it was.
    pub async fn execute(
        &self,
        portfolio: &mut Portfolio,
        trade: &Trade,
    ) -> Result<Trade, EngineError> {
        trade.validate()?;
        let fill_price = self.cache.price(&trade.symbol).await;
        apply_fill(portfolio, trade, fill_price)
    }
}

/// Apply a fill at a known price. Pure with respect to the quote cache, so
/// accounting invariants are testable without any async machinery.
pub fn apply_fill(
    portfolio: &mut Portfolio,
    trade: &Trade,
    fill_price: Decimal,
) -> Result<Trade, EngineError> {
    trade.validate()?;
    if fill_price <= Decimal::ZERO {
        return Err(EngineError::MalformedTrade(format!(
            "non-positive fill price {} for {}",
            fill_price, trade.symbol
        )));
    }

    let quantity = trade.quantity;
    let notional = fill_price * Decimal::from(quantity);

    let mut executed = trade.clone();
    executed.price = fill_price;
    executed.profit_loss = Decimal::ZERO;

    match trade.side {
        TradeSide::Buy => {
            if portfolio.cash_balance < notional {
                return Err(EngineError::InsufficientFunds {
                    required: notional,
                    available: portfolio.cash_balance,
                });
            }

            portfolio.cash_balance -= notional;

            match portfolio.holdings.entry(trade.symbol.clone()) {
                Entry::Occupied(mut entry) => {
                    let holding = entry.get_mut();
                    holding.quantity += quantity;
                    holding.total_cost += notional;
                    holding.average_price =
                        holding.total_cost / Decimal::from(holding.quantity);
                    holding.mark(fill_price);
                }
                Entry::Vacant(entry) => {
                    entry.insert(Holding::open(trade.symbol.clone(), quantity, fill_price));
                }
            }
        }

        TradeSide::Sell => {
            let Some(holding) = portfolio.holdings.get_mut(&trade.symbol) else {
                return Err(EngineError::InsufficientShares {
                    symbol: trade.symbol.clone(),
                    requested: quantity,
                    held: 0,
                });
            };
            if holding.quantity < quantity {
                return Err(EngineError::InsufficientShares {
                    symbol: trade.symbol.clone(),
                    requested: quantity,
                    held: holding.quantity,
                });
            }

            let cost_basis = holding.average_price * Decimal::from(quantity);
            let realized = notional - cost_basis;

            executed.profit_loss = realized;
            portfolio.cash_balance += notional;
            portfolio.realized_pnl += realized;

            if holding.quantity == quantity {
                portfolio.holdings.remove(&trade.symbol);
            } else {
                holding.quantity -= quantity;
                holding.total_cost -= cost_basis;
                holding.mark(fill_price);
            }
        }
    }

    portfolio.refresh_allocations();
    portfolio.history.push_front(executed.clone());

    debug!(
        user = portfolio.user_id,
        symbol = %executed.symbol,
        side = executed.side.as_str(),
        quantity = executed.quantity,
        price = %executed.price,
        pnl = %executed.profit_loss,
        "Fill applied"
    );

    Ok(executed)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TradeSide;

    fn buy(symbol: &str, quantity: u64, price: Decimal) -> Trade {
        Trade::new(1, symbol, TradeSide::Buy, quantity, price)
    }

    fn sell(symbol: &str, quantity: u64, price: Decimal) -> Trade {
        Trade::new(1, symbol, TradeSide::Sell, quantity, price)
    }

    #[test]
    fn test_buy_average_then_sell_scenario() {
        let mut portfolio = Portfolio::new(1, dec!(10000));

        apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(100)), dec!(100)).unwrap();
        assert_eq!(portfolio.cash_balance, dec!(9000));
        assert_eq!(portfolio.holdings["AAPL"].quantity, 10);
        assert_eq!(portfolio.holdings["AAPL"].average_price, dec!(100));

        apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(120)), dec!(120)).unwrap();
        assert_eq!(portfolio.cash_balance, dec!(7800));
        assert_eq!(portfolio.holdings["AAPL"].quantity, 20);
        assert_eq!(portfolio.holdings["AAPL"].average_price, dec!(110));

        let executed =
            apply_fill(&mut portfolio, &sell("AAPL", 15, dec!(130)), dec!(130)).unwrap();
        assert_eq!(executed.profit_loss, dec!(300)); // (130 - 110) * 15
        assert_eq!(portfolio.cash_balance, dec!(9750));
        assert_eq!(portfolio.realized_pnl, dec!(300));
        assert_eq!(portfolio.holdings["AAPL"].quantity, 5);
        assert_eq!(portfolio.holdings["AAPL"].average_price, dec!(110));
    }

    #[test]
    fn test_weighted_average_over_many_buys() {
        let mut portfolio = Portfolio::new(1, dec!(1000000));
        let fills = [(10u64, dec!(50)), (30, dec!(70)), (60, dec!(90))];

        let mut shares = 0u64;
        let mut spent = Decimal::ZERO;
        for (quantity, price) in fills {
            apply_fill(&mut portfolio, &buy("NVDA", quantity, price), price).unwrap();
            shares += quantity;
            spent += price * Decimal::from(quantity);
        }

        let holding = &portfolio.holdings["NVDA"];
        assert_eq!(holding.quantity, shares);
        assert_eq!(holding.average_price, spent / Decimal::from(shares));
        assert_eq!(holding.total_cost, spent);
    }

    #[test]
    fn test_insufficient_funds_leaves_portfolio_untouched() {
        let mut portfolio = Portfolio::new(1, dec!(100));

        let err = apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(50)), dec!(50));
        assert!(matches!(err, Err(EngineError::InsufficientFunds { .. })));

        assert_eq!(portfolio.cash_balance, dec!(100));
        assert!(portfolio.holdings.is_empty());
        assert!(portfolio.history.is_empty());
    }

    #[test]
    fn test_oversized_sell_rejected() {
        let mut portfolio = Portfolio::new(1, dec!(10000));
        apply_fill(&mut portfolio, &buy("AAPL", 5, dec!(100)), dec!(100)).unwrap();

        let err = apply_fill(&mut portfolio, &sell("AAPL", 6, dec!(100)), dec!(100));
        assert!(matches!(
            err,
            Err(EngineError::InsufficientShares { held: 5, requested: 6, .. })
        ));
        assert_eq!(portfolio.holdings["AAPL"].quantity, 5);
        assert_eq!(portfolio.cash_balance, dec!(9500));
    }

    #[test]
    fn test_sell_of_unheld_symbol_rejected() {
        let mut portfolio = Portfolio::new(1, dec!(10000));
        let err = apply_fill(&mut portfolio, &sell("TSLA", 1, dec!(200)), dec!(200));
        assert!(matches!(
            err,
            Err(EngineError::InsufficientShares { held: 0, .. })
        ));
    }

    #[test]
    fn test_full_sell_removes_holding() {
        let mut portfolio = Portfolio::new(1, dec!(10000));
        apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(100)), dec!(100)).unwrap();
        apply_fill(&mut portfolio, &sell("AAPL", 10, dec!(90)), dec!(90)).unwrap();

        // Never lingers as a zero-quantity entry
        assert!(!portfolio.holdings.contains_key("AAPL"));
        assert_eq!(portfolio.realized_pnl, dec!(-100));
        assert_eq!(portfolio.cash_balance, dec!(9900));
    }

    #[test]
    fn test_history_is_newest_first_with_buy_pnl_zero() {
        let mut portfolio = Portfolio::new(1, dec!(10000));
        apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(100)), dec!(100)).unwrap();
        apply_fill(&mut portfolio, &sell("AAPL", 10, dec!(110)), dec!(110)).unwrap();

        assert_eq!(portfolio.history.len(), 2);
        assert_eq!(portfolio.history[0].side, TradeSide::Sell);
        assert_eq!(portfolio.history[0].profit_loss, dec!(100));
        assert_eq!(portfolio.history[1].side, TradeSide::Buy);
        assert_eq!(portfolio.history[1].profit_loss, dec!(0));
    }

    #[test]
    fn test_fill_records_resolved_price_not_trade_print() {
        let mut portfolio = Portfolio::new(1, dec!(10000));

        // Source trade printed at 100, market moved to 104 by execution time
        let executed =
            apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(100)), dec!(104)).unwrap();
        assert_eq!(executed.price, dec!(104));
        assert_eq!(portfolio.cash_balance, dec!(8960));
        assert_eq!(portfolio.holdings["AAPL"].average_price, dec!(104));
    }

    #[test]
    fn test_allocations_refreshed_after_fill() {
        let mut portfolio = Portfolio::new(1, dec!(10000));
        apply_fill(&mut portfolio, &buy("AAPL", 10, dec!(250)), dec!(250)).unwrap();

        // 2500 of 10000 total
        assert_eq!(portfolio.holdings["AAPL"].allocation_percent, dec!(25));

        apply_fill(&mut portfolio, &buy("MSFT", 10, dec!(250)), dec!(250)).unwrap();
        let sum: Decimal = portfolio
            .holdings
            .values()
            .map(|h| h.allocation_percent)
            .sum();
        assert_eq!(sum, dec!(50));
    }

    #[test]
    fn test_malformed_trades_rejected() {
        let mut portfolio = Portfolio::new(1, dec!(10000));

        let mut zero_qty = buy("AAPL", 1, dec!(100));
        zero_qty.quantity = 0;
        assert!(matches!(
            apply_fill(&mut portfolio, &zero_qty, dec!(100)),
            Err(EngineError::MalformedTrade(_))
        ));

        let ok = buy("AAPL", 1, dec!(100));
        assert!(matches!(
            apply_fill(&mut portfolio, &ok, dec!(0)),
            Err(EngineError::MalformedTrade(_))
        ));
    }
}
