//! Shared fixtures for unit tests: a closure-backed provider and a recording observer.

use crate::chunk::Chunk;
use crate::data::{CandleProvider, FetchError, RawCandle};
use crate::driver::RunSummary;
use crate::export::PairSummary;
use crate::granularity::Granularity;
use crate::progress::{DateSpan, ExportObserver};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

type FetchFn = dyn Fn(i64, i64) -> Result<Vec<RawCandle>, FetchError> + Send + Sync;

/// Provider that answers every call with a closure of the window bounds.
pub struct FnProvider {
    respond: Box<FetchFn>,
    calls: AtomicU32,
}

impl FnProvider {
    pub fn new(
        respond: impl Fn(i64, i64) -> Result<Vec<RawCandle>, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CandleProvider for FnProvider {
    fn name(&self) -> &str {
        "fn"
    }

    fn fetch_candles(
        &self,
        _instrument: &str,
        start_unix: i64,
        end_unix: i64,
        _granularity: &Granularity,
    ) -> Result<Vec<RawCandle>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(start_unix, end_unix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStart { provider: String, pairs: usize },
    FetchFailure { attempt: u32, max_retries: u32 },
    ChunkSkipped { attempts: u32 },
    Received { count: usize },
    RangeMismatch,
    InvalidTimestamp(i64),
    EmptyChunk,
    PairWritten { rows: usize },
    PairEmpty,
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ExportObserver for RecordingObserver {
    fn on_run_start(&self, provider: &str, pairs: usize) {
        self.push(Event::RunStart {
            provider: provider.to_string(),
            pairs,
        });
    }

    fn on_pair_start(&self, _instrument: &str, _granularity: &Granularity, _estimated: usize) {}

    fn on_chunk_start(&self, _chunk: &Chunk, _index: usize, _estimated: usize) {}

    fn on_fetch_failure(&self, _chunk: &Chunk, attempt: u32, max_retries: u32, _e: &FetchError) {
        self.push(Event::FetchFailure {
            attempt,
            max_retries,
        });
    }

    fn on_chunk_skipped(&self, _chunk: &Chunk, attempts: u32) {
        self.push(Event::ChunkSkipped { attempts });
    }

    fn on_candles_received(
        &self,
        _instrument: &str,
        _granularity: &Granularity,
        count: usize,
        _observed: DateSpan,
    ) {
        self.push(Event::Received { count });
    }

    fn on_range_mismatch(
        &self,
        _instrument: &str,
        _granularity: &Granularity,
        _expected: DateSpan,
        _observed: DateSpan,
    ) {
        self.push(Event::RangeMismatch);
    }

    fn on_invalid_timestamp(&self, _instrument: &str, _granularity: &Granularity, start_unix: i64) {
        self.push(Event::InvalidTimestamp(start_unix));
    }

    fn on_empty_chunk(&self, _chunk: &Chunk) {
        self.push(Event::EmptyChunk);
    }

    fn on_pair_written(&self, summary: &PairSummary) {
        self.push(Event::PairWritten { rows: summary.rows });
    }

    fn on_pair_empty(&self, _instrument: &str, _granularity: &Granularity) {
        self.push(Event::PairEmpty);
    }

    fn on_run_complete(&self, _summary: &RunSummary) {}
}
