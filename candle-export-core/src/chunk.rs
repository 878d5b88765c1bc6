//! Chunk planning: splits a requested date range into request windows.
//!
//! Every window ends one second before the next one starts, so consecutive
//! windows tile the range without overlap. The last window may reach past the
//! requested end by up to one day; rows beyond the end are trimmed when the
//! pair is finalized.

use crate::granularity::{ChunkSpan, Granularity};
use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

/// One bounded time window submitted as a single API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub instrument: String,
    pub granularity: Granularity,
    pub window_start: DateTime<Utc>,
    /// Inclusive.
    pub window_end: DateTime<Utc>,
}

impl Chunk {
    pub fn start_unix(&self) -> i64 {
        self.window_start.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.window_end.timestamp()
    }
}

/// End (inclusive) of the window that starts at `window_start`.
///
/// The window spans the granularity's [`ChunkSpan`], is clamped to one day past
/// `overall_end`, and then pulled back by one second.
pub fn next_chunk_end(
    window_start: DateTime<Utc>,
    granularity: &Granularity,
    overall_end: DateTime<Utc>,
) -> DateTime<Utc> {
    let limit = overall_end + Duration::days(1);
    let candidate = match granularity.chunk_span() {
        ChunkSpan::Days(days) => window_start + Duration::days(i64::from(days)),
        ChunkSpan::Months(months) => window_start
            .checked_add_months(Months::new(months))
            .unwrap_or(limit),
    };
    candidate.min(limit) - Duration::seconds(1)
}

/// Every window the export loop walks for one pair, in order.
///
/// Empty when `start > end`.
pub fn plan_chunks(
    instrument: &str,
    granularity: &Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let window_end = next_chunk_end(cursor, granularity, end);
        chunks.push(Chunk {
            instrument: instrument.to_string(),
            granularity: granularity.clone(),
            window_start: cursor,
            window_end,
        });
        cursor = window_end + Duration::seconds(1);
    }
    chunks
}

/// Rough number of windows for progress reporting.
///
/// Divides the range by the length of the first window. Month-based spans
/// vary in length, so this is advisory only.
pub fn estimate_chunk_count(
    granularity: &Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> usize {
    if end < start {
        return 0;
    }
    let first_span = (next_chunk_end(start, granularity, end) - start + Duration::seconds(1))
        .num_seconds()
        .max(1);
    let range = (end - start).num_seconds();
    let chunks = (range + first_span - 1) / first_span;
    chunks.max(1) as usize
}
