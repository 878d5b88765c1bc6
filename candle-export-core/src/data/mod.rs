//! Candle sources and the retrying fetch of a single chunk.

pub mod coinbase;
pub mod fetch;
pub mod provider;

pub use coinbase::CoinbaseProvider;
pub use fetch::{fetch_chunk, FetchOutcome, RetryPolicy};
pub use provider::{CandleProvider, FetchError, RawCandle};
