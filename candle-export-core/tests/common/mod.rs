//! Helpers shared by the integration tests: a scripted provider and a logging observer.

#![allow(dead_code)]

use candle_export_core::data::{CandleProvider, FetchError, RawCandle};
use candle_export_core::{
    Chunk, DateSpan, ExportConfig, ExportObserver, ExportOptions, Granularity, PairSummary,
    RunSummary,
};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn daily_candle(day: DateTime<Utc>, close: f64) -> RawCandle {
    RawCandle::from((day.timestamp(), close - 5.0, close + 5.0, close - 1.0, close, 42.0))
}

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub instrument: String,
    pub start_unix: i64,
    pub end_unix: i64,
    pub granularity: String,
}

type Responder = dyn Fn(&Call, usize) -> Result<Vec<RawCandle>, FetchError> + Send + Sync;

/// Provider that records every call and answers through a closure.
///
/// The closure also receives how many times this exact window was requested before.
pub struct ScriptedProvider {
    respond: Box<Responder>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new(
        respond: impl Fn(&Call, usize) -> Result<Vec<RawCandle>, FetchError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl CandleProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_candles(
        &self,
        instrument: &str,
        start_unix: i64,
        end_unix: i64,
        granularity: &Granularity,
    ) -> Result<Vec<RawCandle>, FetchError> {
        let call = Call {
            instrument: instrument.to_string(),
            start_unix,
            end_unix,
            granularity: granularity.to_string(),
        };
        let prior = {
            let mut calls = self.calls.lock().unwrap();
            let prior = calls
                .iter()
                .filter(|c| c.start_unix == start_unix && c.instrument == instrument)
                .count();
            calls.push(call.clone());
            prior
        };
        (self.respond)(&call, prior)
    }
}

/// Observer that keeps a human-readable log line per event.
#[derive(Default)]
pub struct LogObserver {
    pub lines: Mutex<Vec<String>>,
}

impl LogObserver {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn log(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl ExportObserver for LogObserver {
    fn on_run_start(&self, provider: &str, pairs: usize) {
        self.log(format!("run_start {provider} {pairs}"));
    }

    fn on_pair_start(&self, instrument: &str, granularity: &Granularity, estimated: usize) {
        self.log(format!("pair_start {instrument} {granularity} {estimated}"));
    }

    fn on_chunk_start(&self, chunk: &Chunk, index: usize, _estimated: usize) {
        self.log(format!("chunk_start {index} {}", chunk.window_start));
    }

    fn on_fetch_failure(&self, chunk: &Chunk, attempt: u32, max_retries: u32, error: &FetchError) {
        self.log(format!(
            "fetch_failure {} {attempt}/{max_retries} {error}",
            chunk.window_start
        ));
    }

    fn on_chunk_skipped(&self, chunk: &Chunk, attempts: u32) {
        self.log(format!("chunk_skipped {} {attempts}", chunk.window_start));
    }

    fn on_candles_received(
        &self,
        _instrument: &str,
        _granularity: &Granularity,
        count: usize,
        _observed: DateSpan,
    ) {
        self.log(format!("received {count}"));
    }

    fn on_range_mismatch(
        &self,
        _instrument: &str,
        _granularity: &Granularity,
        _expected: DateSpan,
        _observed: DateSpan,
    ) {
        self.log("range_mismatch".to_string());
    }

    fn on_invalid_timestamp(&self, _instrument: &str, _granularity: &Granularity, start_unix: i64) {
        self.log(format!("invalid_timestamp {start_unix}"));
    }

    fn on_empty_chunk(&self, chunk: &Chunk) {
        self.log(format!("empty_chunk {}", chunk.window_start));
    }

    fn on_pair_written(&self, summary: &PairSummary) {
        self.log(format!("pair_written {}", summary.rows));
    }

    fn on_pair_empty(&self, instrument: &str, granularity: &Granularity) {
        self.log(format!("pair_empty {instrument} {granularity}"));
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        self.log(format!("run_complete {}", summary.files_written()));
    }
}

pub fn fast_options(dir: &Path) -> ExportOptions {
    ExportOptions {
        output_dir: dir.to_path_buf(),
        chunk_pause: Duration::ZERO,
    }
}

pub fn config(json: &str) -> ExportConfig {
    ExportConfig::from_json(json).unwrap()
}

/// Data rows of a written CSV, header skipped.
pub fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
