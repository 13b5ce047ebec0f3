use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub trading: TradingConfig,
    pub strategies: Strategies,
    pub trading_windows: TradingWindows,
    pub risk_management: RiskManagement,
    pub ledger: LedgerConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

/// Upper bound for settings expressed in hours (one year).
const MAX_HOURS_SETTING: i64 = 24 * 365;

impl Config {
    /// Checks cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategies.moderate.validate("moderate")?;
        self.strategies.aggressive.validate("aggressive")?;
        self.trading_windows.validate()?;

        if self.trading.products.is_empty() {
            return Err(ConfigError::ValidationError(
                "trading.products must list at least one symbol".to_string(),
            ));
        }
        if self.trading.quote_currency.is_empty() {
            return Err(ConfigError::ValidationError(
                "trading.quote_currency must not be empty".to_string(),
            ));
        }
        if self.trading.trade_amount <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "trading.trade_amount must be greater than 0".to_string(),
            ));
        }
        if self.trading.limit_order_offset < Decimal::ZERO
            || self.trading.limit_order_offset >= Decimal::ONE
        {
            return Err(ConfigError::ValidationError(
                "trading.limit_order_offset must be in [0, 1)".to_string(),
            ));
        }
        if !(1..=MAX_HOURS_SETTING).contains(&self.api.kline_lookback_hours) {
            return Err(ConfigError::ValidationError(format!(
                "api.kline_lookback_hours must be in 1..={MAX_HOURS_SETTING}"
            )));
        }
        if !(1..=MAX_HOURS_SETTING as u64).contains(&self.trading.daily_summary_interval_hours) {
            return Err(ConfigError::ValidationError(format!(
                "trading.daily_summary_interval_hours must be in 1..={MAX_HOURS_SETTING}"
            )));
        }
        if self.risk_management.canary_asset.is_empty() {
            return Err(ConfigError::ValidationError(
                "risk_management.canary_asset must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for the exchange REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Filled from `BINANCE_API_KEY` when empty.
    pub key: String,
    /// Filled from `BINANCE_API_SECRET` when empty.
    pub secret: String,
    pub recv_window_ms: u64,
    /// How much kline history to request per cycle.
    pub kline_lookback_hours: i64,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.us".to_string(),
            key: String::new(),
            secret: String::new(),
            recv_window_ms: 5000,
            kline_lookback_hours: 72,
            request_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn has_credentials(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

/// Shared trading parameters that apply regardless of the active profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub products: Vec<String>,
    pub quote_currency: String,
    /// Notional size of every buy, in quote currency.
    pub trade_amount: Decimal,
    /// Fraction applied below (buy) or above (sell) the current price for limit orders.
    pub limit_order_offset: Decimal,
    pub cycle_interval_secs: u64,
    /// Mandatory pause between symbols to stay under the exchange's rate limits.
    pub symbol_pause_secs: u64,
    pub daily_summary_interval_hours: u64,
    /// Coins worth less than this are left out of the daily summary.
    pub notification_balance_threshold: Decimal,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            products: ["BTCUSDT", "ETHUSDT", "ADAUSDT", "SOLUSDT", "DOGEUSDT", "SHIBUSDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quote_currency: "USDT".to_string(),
            trade_amount: dec!(15.00),
            limit_order_offset: dec!(0.0001),
            cycle_interval_secs: 60,
            symbol_pause_secs: 2,
            daily_summary_interval_hours: 24,
            notification_balance_threshold: Decimal::ZERO,
        }
    }
}

/// Contains the parameter sets for the time-switched profiles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Strategies {
    pub moderate: StrategyProfile,
    pub aggressive: StrategyProfile,
}

impl Default for Strategies {
    fn default() -> Self {
        Self {
            moderate: StrategyProfile {
                granularity: "1h".to_string(),
                short_window: 8,
                long_window: 21,
                oscillator_period: 14,
                oscillator_overbought: 75.0,
                oscillator_oversold: 25.0,
            },
            aggressive: StrategyProfile {
                granularity: "1m".to_string(),
                short_window: 5,
                long_window: 13,
                oscillator_period: 9,
                oscillator_overbought: 80.0,
                oscillator_oversold: 20.0,
            },
        }
    }
}

/// Parameters for the moving-average crossover strategy with an RSI-style filter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyProfile {
    /// Kline interval requested from the exchange (e.g. "1h", "1m").
    pub granularity: String,
    pub short_window: usize,
    pub long_window: usize,
    pub oscillator_period: usize,
    pub oscillator_overbought: f64,
    pub oscillator_oversold: f64,
}

impl StrategyProfile {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.short_window == 0 || self.oscillator_period == 0 {
            return Err(ConfigError::ValidationError(format!(
                "strategies.{name}: windows must be greater than 0"
            )));
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::ValidationError(format!(
                "strategies.{name}: short_window must be less than long_window"
            )));
        }
        if !(0.0..=100.0).contains(&self.oscillator_oversold)
            || !(0.0..=100.0).contains(&self.oscillator_overbought)
            || self.oscillator_oversold >= self.oscillator_overbought
        {
            return Err(ConfigError::ValidationError(format!(
                "strategies.{name}: oscillator thresholds must satisfy 0 <= oversold < overbought <= 100"
            )));
        }
        Ok(())
    }
}

/// UTC hours that switch the bot into the aggressive profile or stop it entirely.
/// Every other hour runs the moderate profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingWindows {
    pub aggressive_hours: Vec<u32>,
    pub stop_hours: Vec<u32>,
}

impl Default for TradingWindows {
    fn default() -> Self {
        Self {
            aggressive_hours: (3..7).collect(),
            stop_hours: vec![2, 7, 23],
        }
    }
}

impl TradingWindows {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hour) = self
            .aggressive_hours
            .iter()
            .chain(self.stop_hours.iter())
            .find(|h| **h > 23)
        {
            return Err(ConfigError::ValidationError(format!(
                "trading_windows: hour {hour} is outside 0-23"
            )));
        }
        let stop: HashSet<u32> = self.stop_hours.iter().copied().collect();
        if let Some(hour) = self.aggressive_hours.iter().find(|h| stop.contains(h)) {
            return Err(ConfigError::ValidationError(format!(
                "trading_windows: hour {hour} is both aggressive and stopped"
            )));
        }
        Ok(())
    }
}

/// Contains the thresholds for the portfolio, crash and canary checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskManagement {
    /// New buys are paused while the total portfolio value is below this.
    pub safe_portfolio_value: Decimal,
    /// A bar-over-bar percent change below this (e.g. -10.0) counts as a crash.
    pub market_crash_threshold_pct: Decimal,
    /// The asset whose holdings act as an early-warning signal.
    pub canary_asset: String,
    /// Minimum USD value of the canary holding before its symbols are halted.
    pub canary_min_value: Decimal,
}

impl Default for RiskManagement {
    fn default() -> Self {
        Self {
            safe_portfolio_value: dec!(200.00),
            market_crash_threshold_pct: dec!(-10.0),
            canary_asset: "BTC".to_string(),
            canary_min_value: dec!(50.00),
        }
    }
}

/// Locations of the append-only CSV files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub trade_log_path: PathBuf,
    pub daily_balance_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            trade_log_path: PathBuf::from("trade_log.csv"),
            daily_balance_path: PathBuf::from("daily_balance.csv"),
        }
    }
}

/// Telegram credentials. Alerting is disabled when either value is empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "meridian.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn overlapping_hour_sets_are_rejected() {
        let mut config = Config::default();
        config.trading_windows.aggressive_hours = vec![2, 3];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hour 2"));
    }

    #[test]
    fn hour_durations_must_be_positive_and_bounded() {
        let mut config = Config::default();
        config.api.kline_lookback_hours = 0;
        assert!(config.validate().is_err());
        config.api.kline_lookback_hours = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.trading.daily_summary_interval_hours = 0;
        assert!(config.validate().is_err());
        config.trading.daily_summary_interval_hours = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("daily_summary_interval_hours"));

        config.trading.daily_summary_interval_hours = 24 * 365;
        config.validate().unwrap();
    }

    #[test]
    fn hours_above_23_are_rejected() {
        let mut config = Config::default();
        config.trading_windows.stop_hours = vec![24];
        assert!(config.validate().is_err());
    }

    #[test]
    fn short_window_must_be_shorter() {
        let mut config = Config::default();
        config.strategies.aggressive.short_window = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_oscillator_thresholds_are_rejected() {
        let mut config = Config::default();
        config.strategies.moderate.oscillator_oversold = 80.0;
        assert!(config.validate().is_err());
    }
}
