//! Candle Export Core — chunked historical candle download and CSV export.
//!
//! This crate contains the whole export pipeline:
//! - Typed, validated configuration (JSON or TOML)
//! - Granularity labels and their request-window spans
//! - Chunk planning over the requested date range
//! - Provider trait, Coinbase public-candles adapter, fixed-delay retrying fetch
//! - Normalization of raw candles with range-mismatch diagnostics
//! - Per-pair export loop with dedup, ordering, trimming and atomic CSV write
//! - Run driver over every (instrument, granularity) pair

pub mod chunk;
pub mod config;
pub mod data;
pub mod driver;
pub mod export;
pub mod granularity;
pub mod normalize;
pub mod progress;

#[cfg(test)]
mod test_support;

pub use chunk::{estimate_chunk_count, next_chunk_end, plan_chunks, Chunk};
pub use config::{ConfigError, ExportConfig};
pub use driver::{run_export, RunSummary};
pub use export::{export_pair, finalize, ExportError, ExportOptions, PairSummary};
pub use granularity::Granularity;
pub use normalize::{normalize, CandleRow};
pub use progress::{DateSpan, ExportObserver, TracingObserver};
