//! Report writer for the JSON result, CSV history and text report of a run.
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/daily/<TICKER>_<date>_max_pain.json     overwritten on rerun
//! <data_dir>/daily/<TICKER>_<date>_report.txt        overwritten on rerun
//! <data_dir>/summaries/<TICKER>_max_pain_history.csv one row per (date, ticker, expiration)
//! ```
//!
//! `<date>` is the market-local trade date of the snapshot, so reruns on the
//! same day land on the same files and replace the same history rows.
//!
//! ## Atomicity
//!
//! All three artifacts are rendered in memory first, staged next to their
//! destinations as `*.tmp`, then renamed into place. Existing destinations
//! are first moved aside to `*.bak`. A failure at any point removes what was
//! staged or already published and restores the backups, so the previous
//! artifacts are left as they were.

pub mod history;
pub mod text;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::MaxPainResult;
use crate::chain::ChainSnapshot;
use crate::error::WriteError;

pub use history::HistoryRecord;

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub ticker: String,
    pub trade_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub current_price: Decimal,
    pub results: Vec<MaxPainResult>,
}

impl RunReport {
    pub fn new(snapshot: &ChainSnapshot, results: Vec<MaxPainResult>) -> Self {
        Self {
            ticker: snapshot.ticker().to_owned(),
            trade_date: snapshot.trade_date(),
            generated_at: snapshot.fetched_at(),
            current_price: snapshot.underlying_price(),
            results,
        }
    }
}

/// Paths written by [`ReportWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub json: PathBuf,
    pub report: PathBuf,
    pub history: PathBuf,
}

/// Writes run artifacts under a data directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    data_dir: PathBuf,
    timezone: Tz,
}

impl ReportWriter {
    /// `timezone` is used to print timestamps in the text report.
    pub fn new(data_dir: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            data_dir: data_dir.into(),
            timezone,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn json_path(&self, ticker: &str, date: NaiveDate) -> PathBuf {
        self.daily_dir().join(format!("{ticker}_{date}_max_pain.json"))
    }

    pub fn report_path(&self, ticker: &str, date: NaiveDate) -> PathBuf {
        self.daily_dir().join(format!("{ticker}_{date}_report.txt"))
    }

    pub fn history_path(&self, ticker: &str) -> PathBuf {
        self.summaries_dir()
            .join(format!("{ticker}_max_pain_history.csv"))
    }

    /// Render the text report without touching the filesystem.
    pub fn render_text(&self, report: &RunReport) -> String {
        text::render(report, self.timezone)
    }

    /// Write the JSON result, the text report and the upserted history.
    ///
    /// Either all three artifacts are replaced or, on error, none is.
    pub fn write(&self, report: &RunReport) -> Result<WrittenArtifacts, WriteError> {
        let paths = WrittenArtifacts {
            json: self.json_path(&report.ticker, report.trade_date),
            report: self.report_path(&report.ticker, report.trade_date),
            history: self.history_path(&report.ticker),
        };

        let json = serde_json::to_vec_pretty(report)?;
        let text = self.render_text(report);
        let mut rows = history::read(&paths.history)?;
        history::upsert(&mut rows, report);
        let csv = history::encode(&paths.history, &rows)?;

        for dir in [self.daily_dir(), self.summaries_dir()] {
            fs::create_dir_all(&dir).map_err(|source| WriteError::Io { path: dir, source })?;
        }

        let mut staged: Vec<Staged> = Vec::with_capacity(3);
        for (dest, bytes) in [
            (&paths.json, json.as_slice()),
            (&paths.report, text.as_bytes()),
            (&paths.history, csv.as_slice()),
        ] {
            match Staged::create(dest, bytes) {
                Ok(s) => staged.push(s),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        commit(&staged)?;

        tracing::info!(
            ticker = %report.ticker,
            json = %paths.json.display(),
            report = %paths.report.display(),
            history = %paths.history.display(),
            rows = rows.len(),
            "run artifacts written"
        );
        Ok(paths)
    }

    /// History rows for `ticker`, optionally only those dated on or after
    /// `since`. A missing history file is an empty history.
    pub fn load_history(&self, ticker: &str, since: Option<NaiveDate>) -> Result<Vec<HistoryRecord>, WriteError> {
        let mut rows = history::read(&self.history_path(ticker))?;
        if let Some(since) = since {
            rows.retain(|r| r.date >= since);
        }
        Ok(rows)
    }

    fn daily_dir(&self) -> PathBuf {
        self.data_dir.join("daily")
    }

    fn summaries_dir(&self) -> PathBuf {
        self.data_dir.join("summaries")
    }
}

/// A fully written temporary file awaiting rename.
struct Staged {
    tmp: PathBuf,
    dest: PathBuf,
}

impl Staged {
    fn create(dest: &Path, bytes: &[u8]) -> Result<Self, WriteError> {
        let tmp = sibling(dest, "tmp");
        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(WriteError::Io { path: tmp, source });
        }

        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
        })
    }

    fn backup(&self) -> PathBuf {
        sibling(&self.dest, "bak")
    }
}

/// `dest` with `.ext` appended to its file name.
fn sibling(dest: &Path, ext: &str) -> PathBuf {
    match dest.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push(".");
            name.push(ext);
            dest.with_file_name(name)
        }
        None => dest.with_extension(ext),
    }
}

/// One artifact's progress through [`commit`].
struct Published<'a> {
    staged: &'a Staged,
    backed_up: bool,
}

/// Rename every staged file into place, all or nothing.
fn commit(staged: &[Staged]) -> Result<(), WriteError> {
    let mut published: Vec<Published<'_>> = Vec::with_capacity(staged.len());

    for (i, s) in staged.iter().enumerate() {
        let backed_up = s.dest.is_file();
        if backed_up {
            if let Err(source) = fs::rename(&s.dest, s.backup()) {
                discard(&staged[i..]);
                roll_back(&published);
                return Err(WriteError::Io {
                    path: s.dest.clone(),
                    source,
                });
            }
        }

        if let Err(source) = fs::rename(&s.tmp, &s.dest) {
            discard(&staged[i..]);
            if backed_up {
                restore(s);
            }
            roll_back(&published);
            return Err(WriteError::Io {
                path: s.dest.clone(),
                source,
            });
        }
        published.push(Published { staged: s, backed_up });
    }

    for p in published.iter().filter(|p| p.backed_up) {
        let bak = p.staged.backup();
        if let Err(e) = fs::remove_file(&bak) {
            tracing::warn!(path = %bak.display(), error = %e, "failed to remove backup");
        }
    }
    Ok(())
}

/// Undo already published artifacts, newest first.
fn roll_back(published: &[Published<'_>]) {
    for p in published.iter().rev() {
        if let Err(e) = fs::remove_file(&p.staged.dest) {
            tracing::warn!(path = %p.staged.dest.display(), error = %e, "failed to remove published file");
        }
        if p.backed_up {
            restore(p.staged);
        }
    }
}

fn restore(s: &Staged) {
    let bak = s.backup();
    if let Err(e) = fs::rename(&bak, &s.dest) {
        tracing::error!(
            backup = %bak.display(),
            path = %s.dest.display(),
            error = %e,
            "failed to restore previous artifact"
        );
    }
}

fn discard(staged: &[Staged]) {
    for s in staged {
        if let Err(e) = fs::remove_file(&s.tmp) {
            tracing::warn!(path = %s.tmp.display(), error = %e, "failed to remove staged file");
        }
    }
}
