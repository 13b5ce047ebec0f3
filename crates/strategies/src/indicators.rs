//! Moving averages and the RSI-style oscillator.
//!
//! Every function here is pure: identical input produces identical output.
//! Values that need more history than is available are reported as
//! [`IndicatorValue::WarmingUp`], never as zero or NaN.

use crate::error::StrategyError;
use configuration::StrategyProfile;
use core_types::PriceBar;
use rust_decimal::prelude::ToPrimitive;

/// A single indicator reading at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    /// Not enough history yet.
    WarmingUp,
    Ready(f64),
}

impl IndicatorValue {
    pub fn value(self) -> Option<f64> {
        match self {
            IndicatorValue::Ready(v) => Some(v),
            IndicatorValue::WarmingUp => None,
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, IndicatorValue::Ready(_))
    }
}

/// The three indicator readings the crossover strategy looks at, keyed by role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub short_avg: IndicatorValue,
    pub long_avg: IndicatorValue,
    pub oscillator: IndicatorValue,
}

/// Indicator columns aligned one-to-one with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub short_avg: Vec<IndicatorValue>,
    pub long_avg: Vec<IndicatorValue>,
    pub oscillator: Vec<IndicatorValue>,
}

impl IndicatorSeries {
    /// Computes all columns for `closes` using the windows of `profile`.
    pub fn from_closes(closes: &[f64], profile: &StrategyProfile) -> Self {
        Self {
            short_avg: sma(closes, profile.short_window),
            long_avg: sma(closes, profile.long_window),
            oscillator: oscillator(closes, profile.oscillator_period),
        }
    }

    /// Converts the bars' closes to `f64` and computes all columns.
    pub fn compute(bars: &[PriceBar], profile: &StrategyProfile) -> Result<Self, StrategyError> {
        let closes = closes_as_f64(bars)?;
        Ok(Self::from_closes(&closes, profile))
    }

    pub fn len(&self) -> usize {
        self.short_avg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short_avg.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<IndicatorPoint> {
        Some(IndicatorPoint {
            short_avg: *self.short_avg.get(index)?,
            long_avg: *self.long_avg.get(index)?,
            oscillator: *self.oscillator.get(index)?,
        })
    }
}

/// Extracts closing prices as `f64` for indicator math.
pub fn closes_as_f64(bars: &[PriceBar]) -> Result<Vec<f64>, StrategyError> {
    bars.iter()
        .map(|bar| {
            bar.close.to_f64().ok_or_else(|| {
                StrategyError::IndicatorError(format!("close {} is not representable as f64", bar.close))
            })
        })
        .collect()
}

/// Simple moving average over `window` values.
///
/// Position `i` holds the mean of `values[i + 1 - window ..= i]`; the first
/// `window - 1` positions are warming up. A zero window never becomes ready.
pub fn sma(values: &[f64], window: usize) -> Vec<IndicatorValue> {
    rolling_mean(values, window)
}

/// RSI-style oscillator over `period` price changes, in `[0, 100]`.
///
/// The first bar has no predecessor; its change counts as neither gain nor
/// loss, so the series lines up with the moving averages and the first defined
/// value is at index `period - 1`. Gains and losses are averaged with a plain
/// rolling mean. When the mean loss is zero the gain/loss ratio is taken as 0,
/// which pins the oscillator at 0 rather than dividing by zero.
pub fn oscillator(closes: &[f64], period: usize) -> Vec<IndicatorValue> {
    let deltas: Vec<f64> = closes
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { 0.0 } else { c - closes[i - 1] })
        .collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    rolling_mean(&gains, period)
        .into_iter()
        .zip(rolling_mean(&losses, period))
        .map(|(gain, loss)| match (gain, loss) {
            (IndicatorValue::Ready(g), IndicatorValue::Ready(l)) => {
                let ratio = if l == 0.0 { 0.0 } else { g / l };
                IndicatorValue::Ready(100.0 - 100.0 / (1.0 + ratio))
            }
            _ => IndicatorValue::WarmingUp,
        })
        .collect()
}

/// Mean of each full trailing window. Each window is summed from scratch so a
/// window of zeros always averages to exactly zero.
fn rolling_mean(values: &[f64], window: usize) -> Vec<IndicatorValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if window == 0 || i + 1 < window {
                IndicatorValue::WarmingUp
            } else {
                let slice = &values[i + 1 - window..=i];
                IndicatorValue::Ready(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}
