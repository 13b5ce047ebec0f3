use core_types::{OrderSide, TradeRecord};
use std::fmt;

/// Whether the bot currently holds a position in a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    /// Holding; carries the BUY that opened the position.
    Open(TradeRecord),
    Closed,
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open(_))
    }

    /// The BUY record backing an open position.
    pub fn entry(&self) -> Option<&TradeRecord> {
        match self {
            PositionState::Open(record) => Some(record),
            PositionState::Closed => None,
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Open(_) => f.write_str("OPEN"),
            PositionState::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Latest record for `symbol` on `side`. Among equal timestamps the later row wins.
fn latest<'a>(records: &'a [TradeRecord], symbol: &str, side: OrderSide) -> Option<&'a TradeRecord> {
    records
        .iter()
        .filter(|r| r.symbol == symbol && r.side == side)
        .fold(None, |best: Option<&TradeRecord>, r| match best {
            Some(b) if b.timestamp > r.timestamp => Some(b),
            _ => Some(r),
        })
}

/// Reconstructs the position for `symbol` from the full trade history.
///
/// Open iff there is a BUY and no SELL strictly after it. A SELL with the same
/// timestamp as the BUY leaves the position open.
pub fn resolve_position(records: &[TradeRecord], symbol: &str) -> PositionState {
    let Some(buy) = latest(records, symbol, OrderSide::Buy) else {
        return PositionState::Closed;
    };
    match latest(records, symbol, OrderSide::Sell) {
        Some(sell) if sell.timestamp > buy.timestamp => PositionState::Closed,
        _ => PositionState::Open(buy.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn rec(symbol: &str, side: OrderSide, at: DateTime<Utc>, order_id: &str) -> TradeRecord {
        TradeRecord {
            timestamp: at,
            order_id: order_id.to_string(),
            symbol: symbol.to_string(),
            side,
            fill_price: dec!(100),
            quantity: dec!(0.15),
            cost: dec!(15),
            commission: dec!(0.015),
            realized_pnl: dec!(0),
        }
    }

    #[test]
    fn empty_history_is_closed() {
        assert_eq!(resolve_position(&[], "BTCUSDT"), PositionState::Closed);
    }

    #[test]
    fn buy_then_sell_round_trip() {
        let buy = rec("BTCUSDT", OrderSide::Buy, t(0), "1");
        let mut log = vec![buy.clone()];
        assert_eq!(resolve_position(&log, "BTCUSDT"), PositionState::Open(buy));

        log.push(rec("BTCUSDT", OrderSide::Sell, t(5), "2"));
        assert_eq!(resolve_position(&log, "BTCUSDT"), PositionState::Closed);
    }

    #[test]
    fn resolving_twice_gives_the_same_answer() {
        let log = vec![
            rec("BTCUSDT", OrderSide::Buy, t(0), "1"),
            rec("BTCUSDT", OrderSide::Sell, t(1), "2"),
            rec("BTCUSDT", OrderSide::Buy, t(2), "3"),
        ];
        let first = resolve_position(&log, "BTCUSDT");
        let second = resolve_position(&log, "BTCUSDT");
        assert_eq!(first, second);
        assert_eq!(first.entry().unwrap().order_id, "3");
    }

    #[test]
    fn sell_at_same_timestamp_leaves_position_open() {
        let log = vec![
            rec("ETHUSDT", OrderSide::Buy, t(10), "1"),
            rec("ETHUSDT", OrderSide::Sell, t(10), "2"),
        ];
        assert!(resolve_position(&log, "ETHUSDT").is_open());
    }

    #[test]
    fn later_row_wins_among_equal_timestamps() {
        let log = vec![
            rec("ETHUSDT", OrderSide::Buy, t(10), "first"),
            rec("ETHUSDT", OrderSide::Buy, t(10), "second"),
        ];
        let state = resolve_position(&log, "ETHUSDT");
        assert_eq!(state.entry().unwrap().order_id, "second");
    }

    #[test]
    fn uses_timestamps_not_row_order() {
        let log = vec![
            rec("ETHUSDT", OrderSide::Sell, t(20), "2"),
            rec("ETHUSDT", OrderSide::Buy, t(10), "1"),
        ];
        assert_eq!(resolve_position(&log, "ETHUSDT"), PositionState::Closed);
    }

    #[test]
    fn other_symbols_are_ignored() {
        let log = vec![
            rec("ETHUSDT", OrderSide::Buy, t(0), "1"),
            rec("ADAUSDT", OrderSide::Sell, t(5), "2"),
        ];
        assert!(resolve_position(&log, "ETHUSDT").is_open());
        assert_eq!(resolve_position(&log, "ADAUSDT"), PositionState::Closed);
        assert_eq!(PositionState::Closed.to_string(), "CLOSED");
    }
}
