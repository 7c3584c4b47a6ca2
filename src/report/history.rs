//! CSV history of daily max-pain results.

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RunReport;
use crate::error::WriteError;

/// One row of `<TICKER>_max_pain_history.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Market-local trade date of the run.
    pub date: NaiveDate,
    pub ticker: String,
    pub expiration: NaiveDate,
    pub days_to_expiration: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_pain_strike: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_percent: Decimal,
    /// Empty when there was no call open interest.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub put_call_ratio: Option<Decimal>,
    pub total_put_oi: u64,
    pub total_call_oi: u64,
    pub contracts_analyzed: usize,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    fn same_key(&self, other: &Self) -> bool {
        self.date == other.date && self.ticker == other.ticker && self.expiration == other.expiration
    }
}

/// One record per result of `report`.
pub fn records(report: &RunReport) -> impl Iterator<Item = HistoryRecord> + '_ {
    report.results.iter().map(|r| HistoryRecord {
        date: report.trade_date,
        ticker: r.ticker.clone(),
        expiration: r.expiration,
        days_to_expiration: r.days_to_expiration,
        max_pain_strike: r.max_pain_strike,
        current_price: r.current_price,
        distance: r.distance,
        distance_percent: r.distance_percent,
        put_call_ratio: r.put_call_ratio,
        total_put_oi: r.total_put_oi,
        total_call_oi: r.total_call_oi,
        contracts_analyzed: r.contracts_analyzed,
        recorded_at: report.generated_at,
    })
}

/// Insert the rows of `report`, replacing rows with the same
/// (date, ticker, expiration) in place and appending the rest.
pub fn upsert(rows: &mut Vec<HistoryRecord>, report: &RunReport) {
    for record in records(report) {
        match rows.iter_mut().find(|r| r.same_key(&record)) {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
    }
}

/// Read the history file; a missing file is an empty history.
pub fn read(path: &Path) -> Result<Vec<HistoryRecord>, WriteError> {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) if is_not_found(&e) => return Ok(Vec::new()),
        Err(source) => {
            return Err(WriteError::Csv {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    reader
        .deserialize()
        .collect::<Result<Vec<HistoryRecord>, _>>()
        .map_err(|source| WriteError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Encode rows (with header) in memory; `path` is only used for errors.
pub fn encode(path: &Path, rows: &[HistoryRecord]) -> Result<Vec<u8>, WriteError> {
    let csv_err = |source: csv::Error| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| WriteError::Io {
            path: path.to_path_buf(),
            source: e.into_error(),
        })
}

fn is_not_found(e: &csv::Error) -> bool {
    matches!(e.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}
