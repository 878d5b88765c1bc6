//! Export loop for one (instrument, granularity) pair.
//!
//! Walks the requested range chunk by chunk, fetches and normalizes each chunk,
//! then deduplicates, sorts and trims the accumulated rows and writes them to a
//! single CSV file. Fetch failures stay inside their chunk; only output I/O can
//! fail a pair.
//!
//! Writes are atomic: write to .tmp then rename.

use crate::chunk::{estimate_chunk_count, next_chunk_end, Chunk};
use crate::config::ExportConfig;
use crate::data::{fetch_chunk, CandleProvider};
use crate::granularity::Granularity;
use crate::normalize::{normalize, CandleRow};
use crate::progress::{DateSpan, ExportObserver};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column header of every exported file.
pub const CSV_HEADER: [&str; 9] = [
    "ProductId",
    "Granularity",
    "StartDate",
    "StartUnix",
    "Low",
    "High",
    "Open",
    "Close",
    "Volume",
];

/// Runtime knobs that are not part of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Directory the CSV files are written into.
    pub output_dir: PathBuf,
    /// Pause after every chunk to stay under the exchange's rate limit.
    pub chunk_pause: std::time::Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            chunk_pause: std::time::Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to move {} into place: {source}", path.display())]
    Rename {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSummary {
    pub instrument: String,
    pub granularity: Granularity,
    /// Chunks walked.
    pub chunks: usize,
    /// Chunks given up on after exhausting retries.
    pub chunks_skipped: usize,
    /// Data rows in the written file.
    pub rows: usize,
    /// Written file, `None` when no chunk returned any candles.
    pub output: Option<PathBuf>,
}

/// File name for a pair's export: `candle_data_<instrument>_<granularity>.csv`.
pub fn output_file_name(instrument: &str, granularity: &Granularity) -> String {
    let instrument = instrument.replace(['/', '\\'], "-");
    format!("candle_data_{instrument}_{granularity}.csv")
}

/// Fetch, merge and write every chunk of one pair.
pub fn export_pair(
    provider: &dyn CandleProvider,
    instrument: &str,
    granularity: &Granularity,
    config: &ExportConfig,
    options: &ExportOptions,
    observer: &dyn ExportObserver,
) -> Result<PairSummary, ExportError> {
    let estimated = estimate_chunk_count(granularity, config.start, config.end);
    observer.on_pair_start(instrument, granularity, estimated);

    let policy = config.retry_policy();
    let mut accumulated: Vec<Vec<CandleRow>> = Vec::new();
    let mut chunks = 0;
    let mut chunks_skipped = 0;
    let mut cursor = config.start;

    while cursor <= config.end {
        let chunk = Chunk {
            instrument: instrument.to_string(),
            granularity: granularity.clone(),
            window_start: cursor,
            window_end: next_chunk_end(cursor, granularity, config.end),
        };
        observer.on_chunk_start(&chunk, chunks, estimated);

        let outcome = fetch_chunk(provider, &chunk, &policy, observer);
        if outcome.is_skipped() {
            chunks_skipped += 1;
        }

        let rows = normalize(
            &outcome.into_candles(),
            instrument,
            granularity,
            DateSpan {
                start: chunk.window_start,
                end: chunk.window_end,
            },
            observer,
        );
        if rows.is_empty() {
            observer.on_empty_chunk(&chunk);
        } else {
            accumulated.push(rows);
        }

        chunks += 1;
        cursor = chunk.window_end + Duration::seconds(1);

        if !options.chunk_pause.is_zero() {
            std::thread::sleep(options.chunk_pause);
        }
    }

    let mut summary = PairSummary {
        instrument: instrument.to_string(),
        granularity: granularity.clone(),
        chunks,
        chunks_skipped,
        rows: 0,
        output: None,
    };

    if accumulated.is_empty() {
        observer.on_pair_empty(instrument, granularity);
        return Ok(summary);
    }

    // Rows may all trim away past `end`; the file is still rewritten, header only.
    let rows = finalize(accumulated, config.end);

    fs::create_dir_all(&options.output_dir).map_err(|source| ExportError::CreateDir {
        path: options.output_dir.clone(),
        source,
    })?;
    let path = options
        .output_dir
        .join(output_file_name(instrument, granularity));
    write_candles_csv(&path, &rows)?;

    summary.rows = rows.len();
    summary.output = Some(path);
    observer.on_pair_written(&summary);
    Ok(summary)
}

/// Merge the chunks of one pair into its final, exportable row set.
///
/// Keeps the first row seen for each (instrument, granularity, start) key,
/// orders rows by start, and drops rows that start after `end`.
pub fn finalize(chunks: Vec<Vec<CandleRow>>, end: DateTime<Utc>) -> Vec<CandleRow> {
    let mut seen = HashSet::new();
    let mut rows: Vec<CandleRow> = chunks
        .into_iter()
        .flatten()
        .filter(|row| seen.insert(row.key()))
        .collect();
    rows.sort_by_key(|row| row.start);
    rows.retain(|row| row.start <= end);
    rows
}

/// Write rows to `path`, replacing any existing file.
pub fn write_candles_csv(path: &Path, rows: &[CandleRow]) -> Result<(), ExportError> {
    let tmp_path = path.with_extension("csv.tmp");

    if let Err(source) = write_rows(&tmp_path, rows) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ExportError::Csv {
            path: path.to_path_buf(),
            source,
        });
    }

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Rename {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Numbers are written in their shortest round-trip form, so an exchange
/// quote of `"16600.10"` lands in the file as `16600.1`.
fn write_rows(path: &Path, rows: &[CandleRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(CSV_HEADER)?;

    for row in rows {
        wtr.write_record(&[
            row.instrument.clone(),
            row.granularity.label().to_string(),
            row.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            row.start_unix.to_string(),
            row.low.to_string(),
            row.high.to_string(),
            row.open.to_string(),
            row.close.to_string(),
            row.volume.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
