use crate::error::LedgerError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

/// Appends one serialized row, writing the header first when the file is new or empty.
pub(crate) fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<(), LedgerError> {
    let needs_header = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => return Err(LedgerError::io(path, e)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LedgerError::io(path, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row).map_err(|e| LedgerError::csv(path, e))?;
    writer.flush().map_err(|e| LedgerError::io(path, e))?;
    Ok(())
}

/// Reads every row of `path`. A missing file reads as empty.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            if let csv::ErrorKind::Io(io) = e.kind() {
                if io.kind() == ErrorKind::NotFound {
                    return Ok(Vec::new());
                }
            }
            return Err(LedgerError::csv(path, e));
        }
    };

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| LedgerError::csv(path, e))
}
