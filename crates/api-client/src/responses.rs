use crate::error::ApiError;
use crate::filters::SymbolFilters;
use core_types::{OrderFill, OrderSide};
use rust_decimal::Decimal;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// `GET /api/v3/time`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    pub server_time: i64,
}

/// `GET /api/v3/ticker/price`
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: Decimal,
}

/// `GET /api/v3/ticker/24hr`. Only the fields the bot reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hrResponse {
    pub symbol: String,
    pub price_change_percent: Decimal,
}

/// `GET /api/v3/account`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub balances: Vec<BalanceResponse>,
}

/// A single asset's balance inside the account response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// `GET /api/v3/exchangeInfo`
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfoResponse {
    pub symbol: String,
    pub filters: Vec<SymbolFilterResponse>,
}

/// One entry of a symbol's `filters` array. Filter types the bot does not use
/// are kept as `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilterResponse {
    #[serde(rename = "PRICE_FILTER")]
    Price {
        #[serde(rename = "tickSize")]
        tick_size: Decimal,
    },
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "stepSize")]
        step_size: Decimal,
    },
    #[serde(other)]
    Other,
}

impl SymbolInfoResponse {
    /// Extracts the tick and step sizes; `None` if either filter is absent.
    pub fn filters(&self) -> Option<SymbolFilters> {
        let tick_size = self.filters.iter().find_map(|f| match f {
            SymbolFilterResponse::Price { tick_size } => Some(*tick_size),
            _ => None,
        })?;
        let step_size = self.filters.iter().find_map(|f| match f {
            SymbolFilterResponse::LotSize { step_size } => Some(*step_size),
            _ => None,
        })?;
        Some(SymbolFilters { tick_size, step_size })
    }
}

/// The `FULL` response from a successful `POST /api/v3/order` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: i64,
    pub status: String,
    #[serde(default)]
    pub fills: Vec<FillResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub price: Decimal,
    pub qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
}

impl OrderResponse {
    /// Aggregates the individual fills into one `OrderFill`.
    ///
    /// The average price is derived from the fills, never from the requested
    /// limit price. An order without fills is reported as `ApiError::Unfilled`.
    pub fn into_fill(self, side: OrderSide) -> Result<OrderFill, ApiError> {
        let quantity: Decimal = self.fills.iter().map(|f| f.qty).sum();
        if self.fills.is_empty() || quantity.is_zero() {
            return Err(ApiError::Unfilled(self.order_id.to_string()));
        }
        let cost: Decimal = self.fills.iter().map(|f| f.qty * f.price).sum();
        let commission: Decimal = self.fills.iter().map(|f| f.commission).sum();

        Ok(OrderFill {
            order_id: self.order_id.to_string(),
            symbol: self.symbol,
            side,
            avg_price: cost / quantity,
            quantity,
            cost,
            commission,
        })
    }
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i16,
    pub msg: String,
}
