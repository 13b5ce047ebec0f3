//! # Meridian Ledger Crate
//!
//! The bot's only durable state: an append-only CSV log of executed trades and a
//! CSV log of end-of-day portfolio values.
//!
//! ## Architectural Principles
//!
//! - **Append-only:** rows are never rewritten or deleted. Position state is derived
//!   from the full history on demand, so a restart loses nothing.
//! - **Swappable store:** the engine talks to the `LedgerStore` trait, so tests can run
//!   against an in-memory fake.
//!
//! ## Public API
//!
//! - `LedgerStore`: the `append` / `read_all` contract.
//! - `CsvTradeLedger`: the file-backed implementation.
//! - `DailyBalanceLog`: daily portfolio snapshots for the summary notification.
//! - `LedgerSummary`: realized P&L and win-rate aggregates for reporting.

pub mod daily_balance;
pub mod error;
mod file;
pub mod summary;
pub mod trade_log;

pub use daily_balance::{DailyBalanceEntry, DailyBalanceLog};
pub use error::LedgerError;
pub use summary::LedgerSummary;
pub use trade_log::CsvTradeLedger;

use core_types::TradeRecord;

/// Persistent, append-only storage for executed trades.
pub trait LedgerStore: Send + Sync {
    /// Appends one record. Existing rows are never touched.
    fn append(&self, record: &TradeRecord) -> Result<(), LedgerError>;

    /// Returns every record in insertion order. A store that has never been
    /// written to returns an empty list.
    fn read_all(&self) -> Result<Vec<TradeRecord>, LedgerError>;
}
