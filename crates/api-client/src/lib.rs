use crate::auth::sign_request;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::ApiConfig;
use core_types::{AssetBalance, OrderFill, OrderSide, PriceBar};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use rust_decimal::Decimal;
use serde::{de::{DeserializeOwned, IgnoredAny}, Deserialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

mod auth;
pub mod error;
pub mod filters;
pub mod responses;

// --- Public API ---
pub use error::{ApiError, CLOCK_SKEW_CODE};
pub use filters::SymbolFilters;
pub use responses::{
    AccountResponse, ApiErrorResponse, BalanceResponse, ExchangeInfoResponse, OrderResponse,
    Ticker24hrResponse, TickerPriceResponse,
};

/// Binance caps a single klines request at this many bars.
const KLINES_PAGE_LIMIT: usize = 1000;

/// The generic, abstract interface for the spot exchange API.
/// The engine only talks to this trait, so a fake can stand in for tests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Measures `server time - local time` and applies it to every later signed
    /// request. Returns the new offset in milliseconds.
    async fn sync_time(&self) -> Result<i64, ApiError>;

    /// Fetches every bar opened within `lookback` of now, oldest first.
    async fn fetch_recent_klines(
        &self,
        symbol: &str,
        interval: &str,
        lookback: Duration,
    ) -> Result<Vec<PriceBar>, ApiError>;

    /// The latest trade price, or `None` when it cannot be retrieved.
    async fn get_current_price(&self, symbol: &str) -> Option<Decimal>;

    /// The 24h price change in percent, or `None` when it cannot be retrieved.
    async fn get_24hr_change_pct(&self, symbol: &str) -> Option<Decimal>;

    /// Free balance for one asset; zero if the account does not hold it. (Authenticated)
    async fn get_asset_balance(&self, asset: &str) -> Result<Decimal, ApiError>;

    /// All assets with a non-zero free balance. (Authenticated)
    async fn get_account_balances(&self) -> Result<Vec<AssetBalance>, ApiError>;

    /// Loads tick/step filters for `symbols` from exchange info.
    async fn load_symbol_filters(&self, symbols: &[String]) -> Result<(), ApiError>;

    /// Filters previously loaded for `symbol`.
    fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, ApiError>;

    /// Places a GTC limit order with already-rounded values. (Authenticated)
    async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderFill, ApiError>;
}

/// A concrete implementation of the `ApiClient` for the Binance spot exchange.
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
    recv_window_ms: u64,
    time_offset_ms: AtomicI64,
    filters: RwLock<HashMap<String, SymbolFilters>>,
}

impl BinanceClient {
    pub fn new(api_config: &ApiConfig) -> Result<Self, ApiError> {
        if !api_config.has_credentials() {
            return Err(ApiError::InvalidCredentials(
                "API key or secret not found in configuration or environment".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&api_config.key)
            .map_err(|e| ApiError::InvalidCredentials(e.to_string()))?;
        headers.insert("X-MBX-APIKEY", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(api_config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: api_config.base_url.trim_end_matches('/').to_string(),
            api_secret: api_config.secret.clone(),
            recv_window_ms: api_config.recv_window_ms,
            time_offset_ms: AtomicI64::new(0),
            filters: RwLock::new(HashMap::new()),
        })
    }

    /// Local time corrected by the last measured server offset, in milliseconds.
    fn exchange_timestamp_ms(&self) -> i64 {
        Utc::now().timestamp_millis() + self.time_offset_ms.load(Ordering::Relaxed)
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        parse_response(response).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ApiError> {
        params.insert("recvWindow", self.recv_window_ms.to_string());
        params.insert("timestamp", self.exchange_timestamp_ms().to_string());

        let query_string =
            serde_qs::to_string(params).map_err(|e| ApiError::InvalidData(e.to_string()))?;
        let signature = sign_request(&self.api_secret, &query_string)?;

        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        );

        let response = self.client.request(method, &url).send().await?;
        parse_response(response).await
    }

    async fn fetch_klines_page(
        &self,
        symbol: &str,
        interval: &str,
        start_time: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, ApiError> {
        let raw: Vec<RawKline> = self
            .get_public(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("startTime", start_time.timestamp_millis().to_string()),
                    ("limit", KLINES_PAGE_LIMIT.to_string()),
                ],
            )
            .await?;
        raw.into_iter().map(RawKline::into_bar).collect()
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    } else {
        let api_error: ApiErrorResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::Deserialization(format!(
                "Failed to deserialize error response: {}. Original text: {}",
                e, text
            ))
        })?;
        Err(ApiError::BinanceError(api_error.code, api_error.msg))
    }
}

// Intermediate struct for deserializing klines from Binance API
#[derive(Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    // Quote volume, trade count, taker volumes and an unused field.
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

impl RawKline {
    fn into_bar(self) -> Result<PriceBar, ApiError> {
        let decimal = |s: &str| {
            Decimal::from_str(s).map_err(|e| ApiError::Deserialization(e.to_string()))
        };
        let millis = |ms: i64| {
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {}", ms)))
        };
        Ok(PriceBar {
            open_time: millis(self.0)?,
            open: decimal(&self.1)?,
            high: decimal(&self.2)?,
            low: decimal(&self.3)?,
            close: decimal(&self.4)?,
            volume: decimal(&self.5)?,
            close_time: millis(self.6)?,
        })
    }
}

#[async_trait]
impl ApiClient for BinanceClient {
    async fn sync_time(&self) -> Result<i64, ApiError> {
        let response: responses::ServerTimeResponse =
            self.get_public("/api/v3/time", &[]).await?;
        let offset = response.server_time - Utc::now().timestamp_millis();
        self.time_offset_ms.store(offset, Ordering::Relaxed);
        tracing::debug!(offset_ms = offset, "Synchronized with exchange server time.");
        Ok(offset)
    }

    async fn fetch_recent_klines(
        &self,
        symbol: &str,
        interval: &str,
        lookback: Duration,
    ) -> Result<Vec<PriceBar>, ApiError> {
        let mut start_time = Utc::now() - lookback;
        let mut bars: Vec<PriceBar> = Vec::new();

        loop {
            let page = self.fetch_klines_page(symbol, interval, start_time).await?;
            let page_len = page.len();
            let Some(last) = page.last() else { break };
            start_time = last.open_time + Duration::milliseconds(1);
            bars.extend(page);
            if page_len < KLINES_PAGE_LIMIT {
                break;
            }
        }

        tracing::debug!(symbol, interval, bars = bars.len(), "Fetched klines.");
        Ok(bars)
    }

    async fn get_current_price(&self, symbol: &str) -> Option<Decimal> {
        let result: Result<TickerPriceResponse, ApiError> = self
            .get_public("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await;
        match result {
            Ok(ticker) => Some(ticker.price),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Could not fetch current price.");
                None
            }
        }
    }

    async fn get_24hr_change_pct(&self, symbol: &str) -> Option<Decimal> {
        let result: Result<Ticker24hrResponse, ApiError> = self
            .get_public("/api/v3/ticker/24hr", &[("symbol", symbol.to_string())])
            .await;
        result.ok().map(|t| t.price_change_percent)
    }

    async fn get_asset_balance(&self, asset: &str) -> Result<Decimal, ApiError> {
        let balances = self.get_account_balances().await?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map_or(Decimal::ZERO, |b| b.free))
    }

    async fn get_account_balances(&self) -> Result<Vec<AssetBalance>, ApiError> {
        let mut params = BTreeMap::new();
        let account: AccountResponse = self
            .send_signed(Method::GET, "/api/v3/account", &mut params)
            .await?;
        Ok(account
            .balances
            .into_iter()
            .filter(|b| b.free > Decimal::ZERO)
            .map(|b| AssetBalance { asset: b.asset, free: b.free })
            .collect())
    }

    async fn load_symbol_filters(&self, symbols: &[String]) -> Result<(), ApiError> {
        let info: ExchangeInfoResponse = self.get_public("/api/v3/exchangeInfo", &[]).await?;
        let mut loaded = HashMap::new();
        for symbol_info in info.symbols.iter().filter(|s| symbols.contains(&s.symbol)) {
            match symbol_info.filters() {
                Some(filters) => {
                    loaded.insert(symbol_info.symbol.clone(), filters);
                }
                None => tracing::warn!(
                    symbol = %symbol_info.symbol,
                    "Exchange info is missing PRICE_FILTER or LOT_SIZE."
                ),
            }
        }
        tracing::info!(loaded = loaded.len(), requested = symbols.len(), "Loaded exchange symbol filters.");

        let mut cache = self
            .filters
            .write()
            .map_err(|_| ApiError::InvalidData("symbol filter cache poisoned".to_string()))?;
        cache.extend(loaded);
        Ok(())
    }

    fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, ApiError> {
        let cache = self
            .filters
            .read()
            .map_err(|_| ApiError::InvalidData("symbol filter cache poisoned".to_string()))?;
        cache
            .get(symbol)
            .copied()
            .ok_or_else(|| ApiError::MissingSymbolInfo(symbol.to_string()))
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderFill, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", symbol.to_string());
        params.insert("side", side.as_str().to_string());
        params.insert("type", "LIMIT".to_string());
        params.insert("timeInForce", "GTC".to_string());
        params.insert("quantity", quantity.normalize().to_string());
        params.insert("price", price.normalize().to_string());
        params.insert("newOrderRespType", "FULL".to_string());

        tracing::info!(symbol, %side, %quantity, %price, "Placing LIMIT order.");
        let response: OrderResponse = self
            .send_signed(Method::POST, "/api/v3/order", &mut params)
            .await?;
        response.into_fill(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig {
            key: "key".to_string(),
            secret: "secret".to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn client_requires_credentials() {
        let err = BinanceClient::new(&ApiConfig::default()).err().unwrap();
        assert!(matches!(err, ApiError::InvalidCredentials(_)));
    }

    #[test]
    fn unloaded_symbol_has_no_filters() {
        let client = BinanceClient::new(&config()).unwrap();
        let err = client.symbol_filters("BTCUSDT").unwrap_err();
        assert!(matches!(err, ApiError::MissingSymbolInfo(s) if s == "BTCUSDT"));
    }

    #[test]
    fn raw_kline_converts_to_bar() {
        let json = r#"[1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
            "148976.11427815", 1499644799999, "2434.19055334", 308, "1756.87402397",
            "28.46694368", "0"]"#;
        let raw: RawKline = serde_json::from_str(json).unwrap();
        let bar = raw.into_bar().unwrap();
        assert_eq!(bar.close, Decimal::from_str("0.01577100").unwrap());
        assert_eq!(bar.open_time.timestamp_millis(), 1499040000000);
    }
}
