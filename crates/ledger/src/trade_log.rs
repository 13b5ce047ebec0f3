use crate::error::LedgerError;
use crate::file::{append_row, read_rows};
use crate::LedgerStore;
use core_types::TradeRecord;
use std::path::{Path, PathBuf};

/// The trade ledger backed by a CSV file with the header
/// `timestamp,order_id,symbol,side,price,quantity,cost,commission,pnl`.
#[derive(Debug, Clone)]
pub struct CsvTradeLedger {
    path: PathBuf,
}

impl CsvTradeLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for CsvTradeLedger {
    fn append(&self, record: &TradeRecord) -> Result<(), LedgerError> {
        append_row(&self.path, record)?;
        tracing::info!(
            order_id = %record.order_id,
            symbol = %record.symbol,
            side = %record.side,
            quantity = %record.quantity,
            price = %record.fill_price,
            pnl = %record.realized_pnl,
            "Logged trade."
        );
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<TradeRecord>, LedgerError> {
        read_rows(&self.path)
    }
}
