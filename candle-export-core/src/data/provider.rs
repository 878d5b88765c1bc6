//! Candle provider trait and structured fetch errors.
//!
//! The CandleProvider trait abstracts over the exchange's candle endpoint so the
//! export loop can be driven by the real HTTP adapter or by a scripted mock.

use crate::granularity::Granularity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One candle exactly as the API returns it, before tagging and validation.
///
/// Field order follows the API: start, low, high, open, close, volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    /// Bucket start, epoch seconds.
    pub start: i64,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<(i64, f64, f64, f64, f64, f64)> for RawCandle {
    fn from((start, low, high, open, close, volume): (i64, f64, f64, f64, f64, f64)) -> Self {
        Self {
            start,
            low,
            high,
            open,
            close,
            volume,
        }
    }
}

/// Failure of a single provider call.
///
/// Every variant is treated as transient by the fetcher: the call is retried
/// with a fixed delay and the chunk is skipped once retries run out.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by exchange (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("fetch error: {0}")]
    Other(String),
}

/// Source of historical candles for one instrument/granularity window.
pub trait CandleProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the candles whose start lies in `[start_unix, end_unix]`.
    fn fetch_candles(
        &self,
        instrument: &str,
        start_unix: i64,
        end_unix: i64,
        granularity: &Granularity,
    ) -> Result<Vec<RawCandle>, FetchError>;
}
