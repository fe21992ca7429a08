//! Per-account CSV trail of confirmed orders.
//!
//! One file per account, `order_<exchange>_<label>.csv`. The header is
//! written once, when the file is created; rows are only ever appended.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::orders::OrderRecord;

/// Column order of every journal file.
pub const HEADER: [&str; 10] = [
    "timestamp",
    "exchange",
    "api_key",
    "symbol",
    "order_id",
    "side",
    "price",
    "amount",
    "cost",
    "status",
];

#[derive(Debug, Clone)]
pub struct OrderJournal {
    dir: PathBuf,
}

impl OrderJournal {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, exchange: &str, label: &str) -> PathBuf {
        self.dir.join(format!("order_{exchange}_{label}.csv"))
    }

    /// Append one row, opening and closing the file around the write.
    pub fn append(&self, record: &OrderRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&record.exchange, &record.account);
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.serialize(record)?;
        writer.flush()?;
        Ok(path)
    }

    /// Every row recorded for an account, oldest first. A missing file is empty.
    pub fn read(&self, exchange: &str, label: &str) -> Result<Vec<OrderRecord>> {
        let path = self.path_for(exchange, label);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<OrderRecord>, csv::Error>>()?;
        Ok(rows)
    }
}
