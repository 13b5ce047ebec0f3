use core_types::{OrderSide, TradeRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Aggregates over the whole trade history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total_trades: usize,
    pub buys: usize,
    pub sells: usize,
    /// Sells with a strictly positive realized P&L.
    pub winning_sells: usize,
    pub realized_pnl: Decimal,
    pub total_commission: Decimal,
}

impl LedgerSummary {
    pub fn from_records(records: &[TradeRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.total_trades += 1;
            acc.total_commission += r.commission;
            match r.side {
                OrderSide::Buy => acc.buys += 1,
                OrderSide::Sell => {
                    acc.sells += 1;
                    acc.realized_pnl += r.realized_pnl;
                    if r.realized_pnl > Decimal::ZERO {
                        acc.winning_sells += 1;
                    }
                }
            }
            acc
        })
    }

    /// Percentage of sells that closed at a profit; zero when nothing was sold.
    pub fn win_rate_pct(&self) -> Decimal {
        if self.sells == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_sells) / Decimal::from(self.sells) * dec!(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trade(side: OrderSide, pnl: Decimal) -> TradeRecord {
        TradeRecord {
            timestamp: Utc::now(),
            order_id: "1".into(),
            symbol: "SOLUSDT".into(),
            side,
            fill_price: dec!(150),
            quantity: dec!(0.1),
            cost: dec!(15),
            commission: dec!(0.01),
            realized_pnl: pnl,
        }
    }

    #[test]
    fn empty_history_has_zero_win_rate() {
        let summary = LedgerSummary::from_records(&[]);
        assert_eq!(summary, LedgerSummary::default());
        assert_eq!(summary.win_rate_pct(), Decimal::ZERO);
    }

    #[test]
    fn counts_wins_and_realized_pnl_over_sells() {
        let records = vec![
            trade(OrderSide::Buy, dec!(0)),
            trade(OrderSide::Sell, dec!(1.5)),
            trade(OrderSide::Buy, dec!(0)),
            trade(OrderSide::Sell, dec!(-0.5)),
            trade(OrderSide::Buy, dec!(0)),
            trade(OrderSide::Sell, dec!(0)),
            trade(OrderSide::Buy, dec!(0)),
            trade(OrderSide::Sell, dec!(2)),
        ];
        let summary = LedgerSummary::from_records(&records);
        assert_eq!(summary.total_trades, 8);
        assert_eq!(summary.sells, 4);
        assert_eq!(summary.winning_sells, 2);
        assert_eq!(summary.realized_pnl, dec!(3));
        assert_eq!(summary.total_commission, dec!(0.08));
        assert_eq!(summary.win_rate_pct(), dec!(50));
    }
}
