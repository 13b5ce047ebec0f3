use crate::error::StrategyError;
use crate::indicators::{IndicatorPoint, IndicatorSeries};
use crate::Strategy;
use configuration::StrategyProfile;
use core_types::{PriceBar, Signal};

pub const REASON_INSUFFICIENT_HISTORY: &str = "insufficient history";
pub const REASON_WARMING_UP: &str = "indicators still warming up";
pub const REASON_BULLISH_CROSSOVER: &str = "bullish crossover confirmed";
pub const REASON_OVERBOUGHT_EXIT: &str = "overbought exit";
pub const REASON_BEARISH_CROSSOVER: &str = "bearish crossover";
pub const REASON_NO_SIGNAL: &str = "no signal";

/// Short/long moving-average crossover with an RSI-style oscillator filter.
///
/// The strategy is stateless: every evaluation recomputes the indicators from
/// the full bar history it is handed.
#[derive(Debug, Clone)]
pub struct MACrossover {
    symbol: String,
    profile: StrategyProfile,
}

impl MACrossover {
    /// Creates a new `MACrossover` instance with the given parameters.
    ///
    /// It performs validation to ensure the parameters are logical.
    pub fn new(profile: StrategyProfile, symbol: String) -> Result<Self, StrategyError> {
        if profile.short_window == 0 || profile.oscillator_period == 0 {
            return Err(StrategyError::InvalidParameters(
                "Windows must be greater than zero".to_string(),
            ));
        }
        if profile.short_window >= profile.long_window {
            return Err(StrategyError::InvalidParameters(
                "Short window must be less than long window".to_string(),
            ));
        }
        Ok(Self { symbol, profile })
    }
}

impl Strategy for MACrossover {
    fn evaluate(&self, bars: &[PriceBar]) -> Result<Signal, StrategyError> {
        let series = IndicatorSeries::compute(bars, &self.profile)?;
        let last = series.len().checked_sub(1);

        if let Some(point) = last.and_then(|i| series.point(i)) {
            tracing::debug!(
                symbol = %self.symbol,
                short_avg = ?point.short_avg.value(),
                long_avg = ?point.long_avg.value(),
                oscillator = ?point.oscillator.value(),
                "Indicators computed."
            );
        }

        let signal = match last {
            Some(index) => signal_at(&series, index, &self.profile),
            None => Signal::hold(REASON_INSUFFICIENT_HISTORY),
        };
        Ok(signal)
    }
}

/// Applies the decision rules to the two most recent indicator points.
///
/// `bar_count` is the number of bars the points were computed from. Rules are
/// checked in a fixed order: bullish crossover, overbought exit, bearish
/// crossover, hold. The overbought exit fires even without a crossunder, and
/// wins over a simultaneous crossunder.
pub fn generate_signal(
    previous: Option<IndicatorPoint>,
    current: IndicatorPoint,
    bar_count: usize,
    profile: &StrategyProfile,
) -> Signal {
    if bar_count < profile.long_window {
        return Signal::hold(REASON_INSUFFICIENT_HISTORY);
    }

    let (Some(short), Some(long), Some(osc)) = (
        current.short_avg.value(),
        current.long_avg.value(),
        current.oscillator.value(),
    ) else {
        return Signal::hold(REASON_WARMING_UP);
    };

    let prev_averages = previous.and_then(|p| Some((p.short_avg.value()?, p.long_avg.value()?)));

    let crossed_above = prev_averages
        .is_some_and(|(prev_short, prev_long)| prev_short <= prev_long && short > long);
    let crossed_below = prev_averages
        .is_some_and(|(prev_short, prev_long)| prev_short >= prev_long && short < long);

    if crossed_above && osc < profile.oscillator_overbought {
        return Signal::buy(REASON_BULLISH_CROSSOVER);
    }
    if osc > profile.oscillator_overbought {
        return Signal::sell(REASON_OVERBOUGHT_EXIT);
    }
    if crossed_below {
        return Signal::sell(REASON_BEARISH_CROSSOVER);
    }
    Signal::hold(REASON_NO_SIGNAL)
}

/// The signal that would have been produced with history up to and including `index`.
pub fn signal_at(series: &IndicatorSeries, index: usize, profile: &StrategyProfile) -> Signal {
    let Some(current) = series.point(index) else {
        return Signal::hold(REASON_INSUFFICIENT_HISTORY);
    };
    let previous = index.checked_sub(1).and_then(|i| series.point(i));
    generate_signal(previous, current, index + 1, profile)
}

/// Replays the rules at every bar of `series`.
pub fn evaluate_history(series: &IndicatorSeries, profile: &StrategyProfile) -> Vec<Signal> {
    (0..series.len()).map(|i| signal_at(series, i, profile)).collect()
}
