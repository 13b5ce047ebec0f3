use chrono::{DateTime, Timelike, Utc};
use configuration::{Strategies, StrategyProfile, TradingWindows};
use std::fmt;

/// The trading regime for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingMode {
    /// No trading at all this cycle.
    Halted,
    Aggressive,
    Moderate,
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradingMode::Halted => "HALTED",
            TradingMode::Aggressive => "AGGRESSIVE",
            TradingMode::Moderate => "MODERATE",
        };
        f.write_str(s)
    }
}

/// Maps wall-clock hours (UTC) to a trading mode and its parameter profile.
///
/// Stop hours take precedence over aggressive hours; configuration validation
/// already rejects overlap, so the order only matters for unvalidated input.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    windows: TradingWindows,
    strategies: Strategies,
}

impl StrategySelector {
    pub fn new(windows: TradingWindows, strategies: Strategies) -> Self {
        Self { windows, strategies }
    }

    pub fn mode_for_hour(&self, hour: u32) -> TradingMode {
        if self.windows.stop_hours.contains(&hour) {
            TradingMode::Halted
        } else if self.windows.aggressive_hours.contains(&hour) {
            TradingMode::Aggressive
        } else {
            TradingMode::Moderate
        }
    }

    pub fn profile_for(&self, mode: TradingMode) -> Option<&StrategyProfile> {
        match mode {
            TradingMode::Halted => None,
            TradingMode::Aggressive => Some(&self.strategies.aggressive),
            TradingMode::Moderate => Some(&self.strategies.moderate),
        }
    }

    /// Selects the mode for `now`. The profile is `None` while halted.
    pub fn select(&self, now: DateTime<Utc>) -> (TradingMode, Option<&StrategyProfile>) {
        let mode = self.mode_for_hour(now.hour());
        (mode, self.profile_for(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn selector() -> StrategySelector {
        StrategySelector::new(TradingWindows::default(), Strategies::default())
    }

    #[test]
    fn every_hour_maps_to_exactly_one_mode() {
        let s = selector();
        let modes: Vec<TradingMode> = (0..24).map(|h| s.mode_for_hour(h)).collect();
        assert_eq!(modes.len(), 24);
        for (hour, mode) in modes.iter().enumerate() {
            let expected = match hour {
                2 | 7 | 23 => TradingMode::Halted,
                3..=6 => TradingMode::Aggressive,
                _ => TradingMode::Moderate,
            };
            assert_eq!(*mode, expected, "hour {hour}");
        }
    }

    #[test]
    fn halted_hours_have_no_profile() {
        let s = selector();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(s.select(now), (TradingMode::Halted, None));
    }

    #[test]
    fn profile_follows_the_clock() {
        let s = selector();
        let early = Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let (mode, profile) = s.select(early);
        assert_eq!(mode, TradingMode::Aggressive);
        assert_eq!(profile.unwrap().granularity, "1m");

        let (mode, profile) = s.select(later);
        assert_eq!(mode, TradingMode::Moderate);
        assert_eq!(profile.unwrap().granularity, "1h");
    }
}
