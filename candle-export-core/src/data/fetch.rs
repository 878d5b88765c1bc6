//! Single-chunk fetch with bounded, fixed-delay retry.

use super::provider::{CandleProvider, RawCandle};
use crate::chunk::Chunk;
use crate::progress::ExportObserver;
use std::time::Duration;

/// How many times a chunk is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls per chunk. Zero means the chunk is never requested.
    pub max_retries: u32,
    /// Fixed pause between attempts; it does not grow.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(2000),
        }
    }
}

/// Result of fetching one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The provider answered (possibly with no candles).
    Fetched(Vec<RawCandle>),
    /// Every attempt failed; the chunk contributes nothing.
    Skipped { attempts: u32 },
}

impl FetchOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FetchOutcome::Skipped { .. })
    }

    pub fn into_candles(self) -> Vec<RawCandle> {
        match self {
            FetchOutcome::Fetched(candles) => candles,
            FetchOutcome::Skipped { .. } => Vec::new(),
        }
    }
}

/// Fetch one chunk, retrying failed calls up to `policy.max_retries` times in total.
///
/// Failures never propagate: each one is reported to the observer and, once
/// attempts run out, the chunk is reported as skipped.
pub fn fetch_chunk(
    provider: &dyn CandleProvider,
    chunk: &Chunk,
    policy: &RetryPolicy,
    observer: &dyn ExportObserver,
) -> FetchOutcome {
    let start_unix = chunk.start_unix();
    let end_unix = chunk.end_unix();

    let mut attempts = 0;
    while attempts < policy.max_retries {
        match provider.fetch_candles(&chunk.instrument, start_unix, end_unix, &chunk.granularity) {
            Ok(candles) => return FetchOutcome::Fetched(candles),
            Err(e) => {
                attempts += 1;
                observer.on_fetch_failure(chunk, attempts, policy.max_retries, &e);
                if attempts < policy.max_retries && !policy.retry_delay.is_zero() {
                    std::thread::sleep(policy.retry_delay);
                }
            }
        }
    }

    observer.on_chunk_skipped(chunk, attempts);
    FetchOutcome::Skipped { attempts }
}
