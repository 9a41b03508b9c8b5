// Simulated portfolio: cash plus a single-lot position in one asset

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Signal, Trade, TradeSide};

/// Why a signal produced no order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoActionReason {
    /// Hold signal: nothing to do in either state
    Hold,
    /// Buy signal while already holding the lot
    AlreadyInPosition,
    /// Sell signal with no open position
    NoOpenPosition,
}

/// Result of feeding one signal to the portfolio
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// A simulated order executed; sells carry `realized_pnl`
    Filled(Trade),
    /// Buy rejected: cost exceeds available cash, state untouched
    InsufficientFunds { required: f64, available: f64 },
    /// The (signal, state) pair has no transition, state untouched
    NoAction(NoActionReason),
}

/// Paper-trading portfolio state machine
///
/// Two states: flat and long exactly one lot of `order_quantity`. Only
/// `apply` mutates balances, and every call returns an explicit outcome.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: f64,
    holdings: f64,
    entry_price: f64,
    in_position: bool,
    order_quantity: f64,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_balance: f64, order_quantity: f64) -> Self {
        Self {
            cash: initial_balance,
            holdings: 0.0,
            entry_price: 0.0,
            in_position: false,
            order_quantity,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> f64 {
        self.holdings
    }

    pub fn in_position(&self) -> bool {
        self.in_position
    }

    /// Entry price of the open position; meaningless while flat
    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn order_quantity(&self) -> f64 {
        self.order_quantity
    }

    /// Every simulated fill so far, oldest first
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Cash plus holdings marked at `current_price`
    pub fn value(&self, current_price: f64) -> f64 {
        self.cash + self.holdings * current_price
    }

    /// Whether this signal would move the state machine
    ///
    /// Lets the caller skip fetching a fresh execution price for ticks that
    /// cannot trade.
    pub fn transition_pending(&self, signal: Signal) -> bool {
        match signal {
            Signal::Buy => !self.in_position,
            Signal::Sell => self.in_position,
            Signal::Hold => false,
        }
    }

    /// Execute the transition for (signal, current state) at `price`
    pub fn apply(&mut self, signal: Signal, price: f64) -> OrderOutcome {
        match signal {
            Signal::Buy if !self.in_position => self.open(price),
            Signal::Sell if self.in_position => self.close(price),
            Signal::Buy => OrderOutcome::NoAction(NoActionReason::AlreadyInPosition),
            Signal::Sell => OrderOutcome::NoAction(NoActionReason::NoOpenPosition),
            Signal::Hold => OrderOutcome::NoAction(NoActionReason::Hold),
        }
    }

    fn open(&mut self, price: f64) -> OrderOutcome {
        let cost = price * self.order_quantity;
        if self.cash < cost {
            return OrderOutcome::InsufficientFunds {
                required: cost,
                available: self.cash,
            };
        }

        self.cash -= cost;
        self.holdings += self.order_quantity;
        self.entry_price = price;
        self.in_position = true;

        let trade = Trade {
            id: Uuid::new_v4(),
            side: TradeSide::Buy,
            price,
            quantity: self.order_quantity,
            timestamp: Utc::now(),
            realized_pnl: None,
        };
        self.trades.push(trade.clone());
        OrderOutcome::Filled(trade)
    }

    fn close(&mut self, price: f64) -> OrderOutcome {
        let revenue = price * self.order_quantity;
        let pnl = (price - self.entry_price) * self.order_quantity;

        self.cash += revenue;
        self.holdings -= self.order_quantity;
        self.in_position = false;

        let trade = Trade {
            id: Uuid::new_v4(),
            side: TradeSide::Sell,
            price,
            quantity: self.order_quantity,
            timestamp: Utc::now(),
            realized_pnl: Some(pnl),
        };
        self.trades.push(trade.clone());
        OrderOutcome::Filled(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(portfolio: &Portfolio) {
        // Single-lot discipline: holdings are either zero or exactly one lot
        let qty = portfolio.order_quantity();
        assert!(
            portfolio.holdings() == 0.0 || portfolio.holdings() == qty,
            "holdings {} not in {{0, {}}}",
            portfolio.holdings(),
            qty
        );
        assert!(portfolio.cash() >= 0.0, "cash went negative");
        assert_eq!(portfolio.in_position(), portfolio.holdings() == qty);
    }

    #[test]
    fn test_buy_while_flat_opens_position() {
        let mut portfolio = Portfolio::new(100.0, 0.001);

        let outcome = portfolio.apply(Signal::Buy, 50_000.0);
        assert!(matches!(outcome, OrderOutcome::Filled(_)));
        assert_eq!(portfolio.cash(), 50.0);
        assert_eq!(portfolio.holdings(), 0.001);
        assert!(portfolio.in_position());
        assert_eq!(portfolio.entry_price(), 50_000.0);
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_sell_while_long_closes_with_pnl() {
        let mut portfolio = Portfolio::new(100.0, 0.001);
        portfolio.apply(Signal::Buy, 100.0);

        let outcome = portfolio.apply(Signal::Sell, 110.0);
        let trade = match outcome {
            OrderOutcome::Filled(trade) => trade,
            other => panic!("expected fill, got {:?}", other),
        };
        assert_eq!(trade.side, TradeSide::Sell);
        assert!((trade.realized_pnl.unwrap() - 0.01).abs() < 1e-12);
        assert!(!portfolio.in_position());
        assert_eq!(portfolio.holdings(), 0.0);
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_insufficient_funds_rejects_without_mutation() {
        let mut portfolio = Portfolio::new(0.00005, 0.001);

        let outcome = portfolio.apply(Signal::Buy, 100.0);
        assert_eq!(
            outcome,
            OrderOutcome::InsufficientFunds {
                required: 0.1,
                available: 0.00005,
            }
        );
        assert_eq!(portfolio.cash(), 0.00005);
        assert_eq!(portfolio.holdings(), 0.0);
        assert!(!portfolio.in_position());
        assert!(portfolio.trades().is_empty());
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_buy_while_long_is_noop() {
        let mut portfolio = Portfolio::new(100.0, 0.001);
        portfolio.apply(Signal::Buy, 50_000.0);
        let cash_before = portfolio.cash();

        let outcome = portfolio.apply(Signal::Buy, 60_000.0);
        assert_eq!(
            outcome,
            OrderOutcome::NoAction(NoActionReason::AlreadyInPosition)
        );
        assert_eq!(portfolio.cash(), cash_before);
        assert_eq!(portfolio.holdings(), 0.001);
        // Entry price must not be overwritten by the rejected buy
        assert_eq!(portfolio.entry_price(), 50_000.0);
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_sell_while_flat_is_noop() {
        let mut portfolio = Portfolio::new(100.0, 0.001);

        let outcome = portfolio.apply(Signal::Sell, 50_000.0);
        assert_eq!(outcome, OrderOutcome::NoAction(NoActionReason::NoOpenPosition));
        assert_eq!(portfolio.cash(), 100.0);
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_hold_is_noop_in_both_states() {
        let mut portfolio = Portfolio::new(100.0, 0.001);
        assert_eq!(
            portfolio.apply(Signal::Hold, 50_000.0),
            OrderOutcome::NoAction(NoActionReason::Hold)
        );

        portfolio.apply(Signal::Buy, 50_000.0);
        assert_eq!(
            portfolio.apply(Signal::Hold, 50_000.0),
            OrderOutcome::NoAction(NoActionReason::Hold)
        );
        assert_invariants(&portfolio);
    }

    #[test]
    fn test_transition_pending() {
        let mut portfolio = Portfolio::new(100.0, 0.001);
        assert!(portfolio.transition_pending(Signal::Buy));
        assert!(!portfolio.transition_pending(Signal::Sell));
        assert!(!portfolio.transition_pending(Signal::Hold));

        portfolio.apply(Signal::Buy, 50_000.0);
        assert!(!portfolio.transition_pending(Signal::Buy));
        assert!(portfolio.transition_pending(Signal::Sell));
        assert!(!portfolio.transition_pending(Signal::Hold));
    }

    #[test]
    fn test_value_marks_holdings_to_price() {
        let mut portfolio = Portfolio::new(100.0, 0.001);
        assert_eq!(portfolio.value(50_000.0), 100.0);

        portfolio.apply(Signal::Buy, 50_000.0);
        assert_eq!(portfolio.value(50_000.0), 100.0);
        assert_eq!(portfolio.value(51_000.0), 101.0);
    }

    #[test]
    fn test_invariants_hold_across_signal_sequences() {
        let signals = [
            Signal::Hold,
            Signal::Buy,
            Signal::Buy,
            Signal::Hold,
            Signal::Sell,
            Signal::Sell,
            Signal::Buy,
            Signal::Sell,
        ];
        let mut portfolio = Portfolio::new(100.0, 0.001);
        let mut price = 50_000.0;

        for signal in signals {
            portfolio.apply(signal, price);
            assert_invariants(&portfolio);
            price += 100.0;
        }
        assert_eq!(portfolio.trades().len(), 4);
    }
}
