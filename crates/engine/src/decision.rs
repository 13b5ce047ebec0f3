use core_types::{Signal, SignalKind, TradeRecord};
use executor::PositionState;
use risk::RiskVerdict;

/// What the orchestrator does with a symbol after the signal is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Noop,
}

/// Buys need a BUY signal, no open position and a verdict that allows buying.
/// Sells need a SELL signal and an open position; risk never blocks them.
pub fn decide(signal: SignalKind, position: &PositionState, verdict: &RiskVerdict) -> Decision {
    match (signal, position.is_open()) {
        (SignalKind::Buy, false) if verdict.allows_buy() => Decision::Buy,
        (SignalKind::Sell, true) => Decision::Sell,
        _ => Decision::Noop,
    }
}

/// The result of processing one symbol in a strategy cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    /// The canary check failed; the symbol was not analyzed.
    CanaryHalted,
    /// A sharp drop was detected; the symbol was skipped for this cycle.
    CrashDetected,
    /// Market data was unusable.
    Skipped(String),
    Evaluated {
        signal: Signal,
        decision: Decision,
        /// The ledger row appended by a successful execution.
        trade: Option<TradeRecord>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::OrderSide;
    use rust_decimal::Decimal;

    fn open() -> PositionState {
        PositionState::Open(TradeRecord {
            timestamp: Utc::now(),
            order_id: "1".into(),
            symbol: "ETHUSDT".into(),
            side: OrderSide::Buy,
            fill_price: Decimal::ONE,
            quantity: Decimal::ONE,
            cost: Decimal::ONE,
            commission: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        })
    }

    fn verdict(portfolio_safe: bool) -> RiskVerdict {
        RiskVerdict { portfolio_safe, asset_halted: false, crash_detected: false }
    }

    #[test]
    fn buy_requires_closed_position_and_safe_portfolio() {
        let closed = PositionState::Closed;
        assert_eq!(decide(SignalKind::Buy, &closed, &verdict(true)), Decision::Buy);
        assert_eq!(decide(SignalKind::Buy, &closed, &verdict(false)), Decision::Noop);
        assert_eq!(decide(SignalKind::Buy, &open(), &verdict(true)), Decision::Noop);
    }

    #[test]
    fn sell_ignores_portfolio_check() {
        assert_eq!(decide(SignalKind::Sell, &open(), &verdict(false)), Decision::Sell);
        assert_eq!(decide(SignalKind::Sell, &PositionState::Closed, &verdict(true)), Decision::Noop);
    }

    #[test]
    fn hold_never_trades() {
        assert_eq!(decide(SignalKind::Hold, &open(), &verdict(true)), Decision::Noop);
        assert_eq!(decide(SignalKind::Hold, &PositionState::Closed, &verdict(true)), Decision::Noop);
    }
}
