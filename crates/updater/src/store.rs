//! CSV-backed candle table store.
//!
//! Layout: header `timestamp,open,high,low,close,volume`, one row per
//! hour, sorted ascending. NaN values persist as empty cells and empty
//! or unparseable value cells load back as NaN. Saving serializes the
//! full table first, then swaps it in with a temp-file rename so a
//! crash mid-write never corrupts the previous good copy.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use ohlc_common::{coerce_price, Candle, CandleTable, StoreError, TIMESTAMP_FORMAT};

const HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub struct CandleStore {
    path: PathBuf,
}

impl CandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full table. A missing file is `NotFound` (the caller
    /// treats it as a hard stop); everything else unreadable is
    /// `Corrupt`.
    pub fn load(&self) -> Result<CandleTable, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(StoreError::Corrupt(format!(
                "unexpected header {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let mut rows = Vec::new();
        let mut previous: Option<NaiveDateTime> = None;
        for (index, record) in reader.records().enumerate() {
            let line = index + 2; // 1-based, after the header
            let record = record
                .map_err(|e| StoreError::Corrupt(format!("line {line}: {e}")))?;

            let raw_timestamp = record.get(0).unwrap_or("");
            let timestamp = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
                .map_err(|_| {
                    StoreError::Corrupt(format!("line {line}: bad timestamp {raw_timestamp:?}"))
                })?;

            if previous.is_some_and(|p| p >= timestamp) {
                return Err(StoreError::Corrupt(format!(
                    "line {line}: timestamps not strictly increasing at {raw_timestamp}"
                )));
            }
            previous = Some(timestamp);

            rows.push(Candle {
                timestamp,
                open: coerce_price(record.get(1).unwrap_or("")),
                high: coerce_price(record.get(2).unwrap_or("")),
                low: coerce_price(record.get(3).unwrap_or("")),
                close: coerce_price(record.get(4).unwrap_or("")),
                volume: coerce_price(record.get(5).unwrap_or("")),
            });
        }

        let table = CandleTable::from_rows(rows);
        if let Some(latest) = table.latest() {
            info!(
                "✓ Current table latest timestamp: {}",
                latest.format(TIMESTAMP_FORMAT)
            );
        }
        Ok(table)
    }

    /// Persists the full table: serialize everything into memory,
    /// write a sibling temp file, then rename over the target.
    pub fn save(&self, table: &CandleTable) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER).map_err(csv_io)?;
        for candle in table.rows() {
            writer
                .write_record([
                    candle.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    format_price(candle.open),
                    format_price(candle.high),
                    format_price(candle.low),
                    format_price(candle.close),
                    format_price(candle.volume),
                ])
                .map_err(csv_io)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| StoreError::Io(std::io::Error::new(e.error().kind(), e.to_string())))?;

        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, buffer)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn format_price(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn csv_io(error: csv::Error) -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, error))
}
