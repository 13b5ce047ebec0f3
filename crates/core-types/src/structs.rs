use crate::enums::{OrderSide, SignalKind};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle as produced by the market-data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
}

/// Checks that a bar sequence is strictly increasing by `open_time`.
pub fn ensure_ordered(bars: &[PriceBar]) -> Result<(), CoreError> {
    for pair in bars.windows(2) {
        if pair[1].open_time <= pair[0].open_time {
            return Err(CoreError::UnorderedBars {
                previous: pair[0].open_time,
                next: pair[1].open_time,
            });
        }
    }
    Ok(())
}

/// One executed trade as stored in the ledger. Column names match the CSV header.
///
/// Amounts are (de)serialized as strings so values survive a round trip through
/// text formats without passing through `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "price", with = "rust_decimal::serde::str")]
    pub fill_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub commission: Decimal,
    #[serde(rename = "pnl", with = "rust_decimal::serde::str")]
    pub realized_pnl: Decimal,
}

/// The normalized result of a filled (or partially filled) limit order.
///
/// Values are aggregated over the exchange's individual fills, so `avg_price`
/// may differ from the requested limit price.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub avg_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub commission: Decimal,
}

impl OrderFill {
    /// Builds the ledger entry for this fill. `realized_pnl` is zero for buys.
    pub fn into_record(self, timestamp: DateTime<Utc>, realized_pnl: Decimal) -> TradeRecord {
        let realized_pnl = match self.side {
            OrderSide::Buy => Decimal::ZERO,
            OrderSide::Sell => realized_pnl,
        };
        TradeRecord {
            timestamp,
            order_id: self.order_id,
            symbol: self.symbol,
            side: self.side,
            fill_price: self.avg_price,
            quantity: self.quantity,
            cost: self.cost,
            commission: self.commission,
            realized_pnl,
        }
    }
}

/// A free balance for one asset held on the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
}

/// A balance enriched with valuation data for summaries and reports.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBalance {
    pub asset: String,
    pub quantity: Decimal,
    pub usd_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_pct: Decimal,
    pub change_24h: Decimal,
    pub change_24h_pct: Decimal,
}

/// A strategy decision together with the human-readable reason behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub reason: String,
}

impl Signal {
    pub fn buy(reason: impl Into<String>) -> Self {
        Self { kind: SignalKind::Buy, reason: reason.into() }
    }

    pub fn sell(reason: impl Into<String>) -> Self {
        Self { kind: SignalKind::Sell, reason: reason.into() }
    }

    pub fn hold(reason: impl Into<String>) -> Self {
        Self { kind: SignalKind::Hold, reason: reason.into() }
    }
}
