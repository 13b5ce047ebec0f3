use crate::error::LedgerError;
use crate::file::{append_row, read_rows};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One end-of-day portfolio snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalanceEntry {
    pub date: NaiveDate,
    #[serde(rename = "total_portfolio_value_usdt", with = "rust_decimal::serde::str")]
    pub total_value: Decimal,
}

/// Append-only log of daily portfolio values, used to compute the
/// day-over-day change in the summary notification.
#[derive(Debug, Clone)]
pub struct DailyBalanceLog {
    path: PathBuf,
}

impl DailyBalanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Result<Vec<DailyBalanceEntry>, LedgerError> {
        read_rows(&self.path)
    }

    pub fn log_daily_balance(&self, date: NaiveDate, total_value: Decimal) -> Result<(), LedgerError> {
        append_row(&self.path, &DailyBalanceEntry { date, total_value })?;
        tracing::info!(%date, total_value = %total_value.round_dp(2), "Logged daily balance.");
        Ok(())
    }

    /// The most recent value logged on a day other than `today`.
    pub fn previous_day_value(&self, today: NaiveDate) -> Result<Option<Decimal>, LedgerError> {
        Ok(self
            .entries()?
            .into_iter()
            .rev()
            .find(|e| e.date != today)
            .map(|e| e.total_value))
    }

    /// Whether the last row of the log is dated `today`.
    pub fn has_logged_today(&self, today: NaiveDate) -> Result<bool, LedgerError> {
        Ok(self.entries()?.last().is_some_and(|e| e.date == today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn empty_log_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = DailyBalanceLog::new(dir.path().join("daily_balance.csv"));
        assert_eq!(log.previous_day_value(day(2)).unwrap(), None);
        assert!(!log.has_logged_today(day(2)).unwrap());
    }

    #[test]
    fn previous_day_skips_entries_from_today() {
        let dir = tempfile::tempdir().unwrap();
        let log = DailyBalanceLog::new(dir.path().join("daily_balance.csv"));
        log.log_daily_balance(day(1), dec!(210.50)).unwrap();
        log.log_daily_balance(day(2), dec!(215.00)).unwrap();

        assert!(log.has_logged_today(day(2)).unwrap());
        assert!(!log.has_logged_today(day(3)).unwrap());
        assert_eq!(log.previous_day_value(day(2)).unwrap(), Some(dec!(210.50)));
        assert_eq!(log.previous_day_value(day(3)).unwrap(), Some(dec!(215.00)));
    }

    #[test]
    fn writes_the_expected_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = DailyBalanceLog::new(dir.path().join("daily_balance.csv"));
        log.log_daily_balance(day(1), dec!(200)).unwrap();
        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw, "date,total_portfolio_value_usdt\n2024-06-01,200\n");
    }
}
