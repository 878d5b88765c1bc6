//! Diagnostics sink for export runs.
//!
//! Components never log directly: they report to an injected
//! [`ExportObserver`]. The CLI passes a [`TracingObserver`]; tests record events.

use crate::chunk::Chunk;
use crate::data::FetchError;
use crate::driver::RunSummary;
use crate::export::PairSummary;
use crate::granularity::Granularity;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Inclusive UTC time range, used for requested and observed candle spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Progress and diagnostic callbacks for an export run.
pub trait ExportObserver: Send {
    /// Called once before the first pair, with the provider's name.
    fn on_run_start(&self, provider: &str, pairs: usize);

    /// Called when starting a pair, with the advisory chunk estimate.
    fn on_pair_start(&self, instrument: &str, granularity: &Granularity, estimated_chunks: usize);

    /// Called before each chunk is fetched. `index` is zero-based.
    fn on_chunk_start(&self, chunk: &Chunk, index: usize, estimated_chunks: usize);

    /// Called after every failed provider call.
    fn on_fetch_failure(&self, chunk: &Chunk, attempt: u32, max_retries: u32, error: &FetchError);

    /// Called when a chunk is given up on after `attempts` failed calls.
    fn on_chunk_skipped(&self, chunk: &Chunk, attempts: u32);

    /// Called when a non-empty batch of candles has been normalized.
    fn on_candles_received(
        &self,
        instrument: &str,
        granularity: &Granularity,
        count: usize,
        observed: DateSpan,
    );

    /// Called when the observed first/last days differ from the requested window.
    fn on_range_mismatch(
        &self,
        instrument: &str,
        granularity: &Granularity,
        expected: DateSpan,
        observed: DateSpan,
    );

    /// Called for a raw row whose start cannot be represented as a timestamp.
    fn on_invalid_timestamp(&self, instrument: &str, granularity: &Granularity, start_unix: i64);

    /// Called when a chunk produced no rows (empty response or skipped).
    fn on_empty_chunk(&self, chunk: &Chunk);

    /// Called when a pair's CSV has been written.
    fn on_pair_written(&self, summary: &PairSummary);

    /// Called when a pair produced no rows at all; no file is written.
    fn on_pair_empty(&self, instrument: &str, granularity: &Granularity);

    /// Called once after the last pair.
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Observer that forwards every event to `tracing`.
pub struct TracingObserver;

impl ExportObserver for TracingObserver {
    fn on_run_start(&self, provider: &str, pairs: usize) {
        info!(
            "candle export started at {} ({pairs} pair(s) from {provider})",
            Utc::now()
        );
    }

    fn on_pair_start(&self, instrument: &str, granularity: &Granularity, estimated_chunks: usize) {
        info!("processing {instrument} {granularity} (~{estimated_chunks} chunk(s))");
    }

    fn on_chunk_start(&self, chunk: &Chunk, index: usize, estimated_chunks: usize) {
        info!(
            "[{}/{}] fetching {} {} from {} to {}",
            index + 1,
            estimated_chunks.max(index + 1),
            chunk.instrument,
            chunk.granularity,
            chunk.window_start,
            chunk.window_end
        );
        debug!(start_unix = chunk.start_unix(), end_unix = chunk.end_unix(), "chunk bounds");
    }

    fn on_fetch_failure(&self, chunk: &Chunk, attempt: u32, max_retries: u32, error: &FetchError) {
        error!(
            "error fetching {} {} (attempt {attempt}/{max_retries}): {error}",
            chunk.instrument, chunk.granularity
        );
    }

    fn on_chunk_skipped(&self, chunk: &Chunk, attempts: u32) {
        error!(
            "giving up on {} {} chunk {} to {} after {attempts} attempt(s); moving to next chunk",
            chunk.instrument, chunk.granularity, chunk.window_start, chunk.window_end
        );
    }

    fn on_candles_received(
        &self,
        instrument: &str,
        granularity: &Granularity,
        count: usize,
        observed: DateSpan,
    ) {
        info!(
            "received {count} record(s) for {instrument} {granularity} from {} to {}",
            observed.start, observed.end
        );
    }

    fn on_range_mismatch(
        &self,
        instrument: &str,
        granularity: &Granularity,
        expected: DateSpan,
        observed: DateSpan,
    ) {
        warn!(
            "date range mismatch for {instrument} {granularity}: expected {} to {}, got {} to {}",
            expected.start, expected.end, observed.start, observed.end
        );
    }

    fn on_invalid_timestamp(&self, instrument: &str, granularity: &Granularity, start_unix: i64) {
        warn!("dropping {instrument} {granularity} candle with out-of-range start {start_unix}");
    }

    fn on_empty_chunk(&self, chunk: &Chunk) {
        warn!(
            "no data returned for {} {} chunk {} to {}",
            chunk.instrument, chunk.granularity, chunk.window_start, chunk.window_end
        );
    }

    fn on_pair_written(&self, summary: &PairSummary) {
        if let Some(path) = &summary.output {
            info!(
                "exported {} row(s) for {} {} to {}",
                summary.rows,
                summary.instrument,
                summary.granularity,
                path.display()
            );
        }
        if summary.chunks_skipped > 0 {
            warn!(
                "{} {}: {} of {} chunk(s) skipped after retries",
                summary.instrument, summary.granularity, summary.chunks_skipped, summary.chunks
            );
        }
    }

    fn on_pair_empty(&self, instrument: &str, granularity: &Granularity) {
        warn!(
            "no data returned for {instrument} {granularity} in the requested range; \
             no file written"
        );
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        info!(
            "candle export completed at {}: {} file(s) written, {} pair(s) empty, \
             {} chunk(s) skipped",
            Utc::now(),
            summary.files_written(),
            summary.empty_pairs(),
            summary.chunks_skipped()
        );
    }
}
