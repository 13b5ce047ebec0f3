use crate::error::RiskError;
use configuration::RiskManagement;
use core_types::{AssetBalance, PriceBar};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Outcome of the portfolio-level check. Only gates new buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortfolioCheck {
    pub safe: bool,
    pub total_value: Decimal,
}

/// Outcome of the per-symbol crash check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashCheck {
    pub crash: bool,
    /// Bar-over-bar change in percent; `None` when it could not be computed.
    pub change_pct: Option<Decimal>,
}

/// Outcome of the canary-asset check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanaryCheck {
    pub safe: bool,
    /// USD value of the canary holding; `None` when the price was unavailable.
    pub value: Option<Decimal>,
}

/// The combined per-symbol verdict, as logged by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskVerdict {
    pub portfolio_safe: bool,
    pub asset_halted: bool,
    pub crash_detected: bool,
}

impl RiskVerdict {
    pub fn allows_buy(&self) -> bool {
        self.portfolio_safe && !self.asset_halted && !self.crash_detected
    }
}

/// Sums `balance * price` over all assets. The quote currency counts at face
/// value; assets without a price contribute nothing.
pub fn portfolio_value(
    balances: &[AssetBalance],
    quote_currency: &str,
    prices: &HashMap<String, Decimal>,
) -> Decimal {
    balances
        .iter()
        .map(|b| {
            if b.asset == quote_currency {
                b.free
            } else {
                prices.get(&b.asset).map_or(Decimal::ZERO, |p| b.free * p)
            }
        })
        .sum()
}

/// Bar-over-bar percent change of the last two closes, or `None` if there
/// are fewer than two bars or the earlier close is zero.
pub fn last_change_pct(bars: &[PriceBar]) -> Option<Decimal> {
    let [.., prev, last] = bars else {
        return None;
    };
    if prev.close.is_zero() {
        return None;
    }
    Some((last.close - prev.close) / prev.close * dec!(100))
}

/// The three independent risk checks, configured once at startup.
///
/// None of these checks ever fails: a denial is a normal decision outcome.
#[derive(Debug, Clone)]
pub struct RiskGate {
    params: RiskManagement,
}

impl RiskGate {
    /// Creates a new `RiskGate` with the given configuration parameters.
    pub fn new(params: RiskManagement) -> Result<Self, RiskError> {
        if params.canary_asset.trim().is_empty() {
            return Err(RiskError::InvalidParameters(
                "canary_asset must not be empty".to_string(),
            ));
        }
        if params.market_crash_threshold_pct >= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(format!(
                "market_crash_threshold_pct must be negative, got {}",
                params.market_crash_threshold_pct
            )));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &RiskManagement {
        &self.params
    }

    /// Denies new buys while the portfolio is worth less than the safe floor.
    pub fn check_portfolio(&self, total_value: Decimal) -> PortfolioCheck {
        let safe = total_value >= self.params.safe_portfolio_value;
        if !safe {
            tracing::warn!(
                total_value = %total_value.round_dp(2),
                threshold = %self.params.safe_portfolio_value,
                "RISK WARNING: Portfolio value is below the safe threshold. Pausing all buys."
            );
        }
        PortfolioCheck { safe, total_value }
    }

    /// Flags a crash when the last close dropped more than the configured threshold.
    pub fn check_crash(&self, symbol: &str, bars: &[PriceBar]) -> CrashCheck {
        let change_pct = last_change_pct(bars);
        let crash = change_pct.is_some_and(|pct| pct < self.params.market_crash_threshold_pct);
        if crash {
            tracing::warn!(
                symbol,
                change_pct = %change_pct.unwrap_or_default().round_dp(2),
                threshold = %self.params.market_crash_threshold_pct,
                "MARKET CRASH DETECTED. Skipping symbol for this cycle."
            );
        }
        CrashCheck { crash, change_pct }
    }

    /// Whether `symbol` trades the canary asset and is therefore subject to the canary check.
    pub fn guards_symbol(&self, symbol: &str) -> bool {
        symbol.contains(self.params.canary_asset.as_str())
    }

    /// Checks the USD value of the canary holding. An unknown price fails closed.
    pub fn check_canary(&self, balance: Decimal, price: Option<Decimal>) -> CanaryCheck {
        let Some(price) = price else {
            tracing::warn!(
                asset = %self.params.canary_asset,
                "Could not get the canary price; treating the canary check as unsafe."
            );
            return CanaryCheck { safe: false, value: None };
        };

        let value = balance * price;
        let safe = value >= self.params.canary_min_value;
        tracing::info!(
            asset = %self.params.canary_asset,
            value = %value.round_dp(2),
            threshold = %self.params.canary_min_value,
            safe,
            "Canary check."
        );
        CanaryCheck { safe, value: Some(value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn gate() -> RiskGate {
        RiskGate::new(RiskManagement::default()).unwrap()
    }

    fn bars(closes: &[Decimal]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                open_time: start + Duration::hours(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: Decimal::ONE,
                close_time: start + Duration::hours(i as i64 + 1),
            })
            .collect()
    }

    #[test]
    fn flat_closes_are_not_a_crash() {
        let check = gate().check_crash("BTCUSDT", &bars(&[dec!(100), dec!(100)]));
        assert!(!check.crash);
        assert_eq!(check.change_pct, Some(Decimal::ZERO));
    }

    #[test]
    fn drop_to_zero_from_nonzero_is_a_crash() {
        // Only a zero *previous* close is guarded; 100 -> 0 is a -100% move.
        let check = gate().check_crash("BTCUSDT", &bars(&[dec!(100), dec!(0)]));
        assert!(check.crash);
        assert_eq!(check.change_pct, Some(dec!(-100)));
    }

    #[test]
    fn zero_previous_close_is_not_a_crash() {
        let check = gate().check_crash("BTCUSDT", &bars(&[dec!(0), dec!(100)]));
        assert!(!check.crash);
        assert_eq!(check.change_pct, None);
    }

    #[test]
    fn fifteen_percent_drop_is_a_crash() {
        let check = gate().check_crash("BTCUSDT", &bars(&[dec!(100), dec!(85)]));
        assert!(check.crash);
        assert_eq!(check.change_pct, Some(dec!(-15)));
    }

    #[test]
    fn drop_exactly_at_threshold_is_not_a_crash() {
        let check = gate().check_crash("BTCUSDT", &bars(&[dec!(100), dec!(90)]));
        assert!(!check.crash);
    }

    #[test]
    fn fewer_than_two_bars_is_not_a_crash() {
        assert!(!gate().check_crash("BTCUSDT", &bars(&[dec!(100)])).crash);
        assert!(!gate().check_crash("BTCUSDT", &[]).crash);
    }

    #[test]
    fn canary_without_price_fails_closed() {
        let check = gate().check_canary(dec!(0.1), None);
        assert!(!check.safe);
        assert_eq!(check.value, None);
    }

    #[test]
    fn canary_below_floor_is_unsafe() {
        let check = gate().check_canary(dec!(0.0001), Some(dec!(60000)));
        assert!(!check.safe);
        assert_eq!(check.value, Some(dec!(6.0000)));
        assert!(gate().check_canary(dec!(0.1), Some(dec!(60000))).safe);
    }

    #[test]
    fn canary_guards_only_symbols_containing_the_asset() {
        let g = gate();
        assert!(g.guards_symbol("BTCUSDT"));
        assert!(!g.guards_symbol("ETHUSDT"));
    }

    #[test]
    fn portfolio_value_counts_quote_at_face_value() {
        let balances = vec![
            AssetBalance { asset: "USDT".into(), free: dec!(100) },
            AssetBalance { asset: "ETH".into(), free: dec!(0.5) },
            AssetBalance { asset: "XYZ".into(), free: dec!(1000) },
        ];
        let prices = HashMap::from([("ETH".to_string(), dec!(2000))]);
        assert_eq!(portfolio_value(&balances, "USDT", &prices), dec!(1100));
    }

    #[test]
    fn portfolio_below_floor_denies_buys() {
        let g = gate();
        assert!(!g.check_portfolio(dec!(199.99)).safe);
        assert!(g.check_portfolio(dec!(200)).safe);
    }

    #[test]
    fn any_failed_check_denies_buys() {
        let clear = RiskVerdict { portfolio_safe: true, asset_halted: false, crash_detected: false };
        assert!(clear.allows_buy());
        assert!(!RiskVerdict { portfolio_safe: false, ..clear }.allows_buy());
        assert!(!RiskVerdict { asset_halted: true, ..clear }.allows_buy());
        assert!(!RiskVerdict { crash_detected: true, ..clear }.allows_buy());
    }

    #[test]
    fn non_negative_crash_threshold_is_rejected() {
        let params = RiskManagement { market_crash_threshold_pct: dec!(5), ..RiskManagement::default() };
        assert!(RiskGate::new(params).is_err());
    }
}
