use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    ApiConfig, Config, LedgerConfig, LoggingConfig, RiskManagement, Strategies, StrategyProfile,
    TelegramConfig, TradingConfig, TradingWindows,
};

/// Environment variables that carry the exchange credentials.
pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
pub const API_SECRET_ENV: &str = "BINANCE_API_SECRET";

/// Loads the application configuration.
///
/// Sources are layered in this order, later ones winning:
/// 1. built-in defaults,
/// 2. the TOML file at `path` (optional, missing files are skipped),
/// 3. `MERIDIAN__SECTION__KEY` environment variables.
///
/// Credentials left empty by all of the above are read from `BINANCE_API_KEY`
/// and `BINANCE_API_SECRET`. The result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("MERIDIAN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;

    if config.api.key.is_empty() {
        config.api.key = std::env::var(API_KEY_ENV).unwrap_or_default();
    }
    if config.api.secret.is_empty() {
        config.api.secret = std::env::var(API_SECRET_ENV).unwrap_or_default();
    }

    config.validate()?;
    tracing::debug!(path = %path.display(), products = config.trading.products.len(), "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.trading.quote_currency, "USDT");
        assert_eq!(config.strategies.moderate.long_window, 21);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[trading]
products = ["ETHUSDT"]
trade_amount = "25.5"

[strategies.aggressive]
granularity = "5m"
short_window = 3
long_window = 9
oscillator_period = 6
oscillator_overbought = 85.0
oscillator_oversold = 15.0

[risk_management]
canary_asset = "ETH"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.trading.products, vec!["ETHUSDT".to_string()]);
        assert_eq!(config.trading.trade_amount, dec!(25.5));
        assert_eq!(config.strategies.aggressive.granularity, "5m");
        assert_eq!(config.risk_management.canary_asset, "ETH");
        // Untouched sections keep their defaults.
        assert_eq!(config.strategies.moderate.short_window, 8);
    }

    #[test]
    fn invalid_file_is_rejected_by_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[trading_windows]\nstop_hours = [3]\n").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
