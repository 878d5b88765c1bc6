//! Candle granularity labels and the request span each one is fetched with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket width of a candle, as labelled by the exchange API.
///
/// Unrecognized labels are kept verbatim in [`Granularity::Other`] and passed
/// through to the API untouched; they are planned with the one-day fallback span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Granularity {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    OneHour,
    TwoHour,
    SixHour,
    OneDay,
    Other(String),
}

/// How far one request window reaches for a given granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSpan {
    Days(u32),
    Months(u32),
}

impl Granularity {
    pub fn label(&self) -> &str {
        match self {
            Granularity::OneMinute => "ONE_MINUTE",
            Granularity::FiveMinute => "FIVE_MINUTE",
            Granularity::FifteenMinute => "FIFTEEN_MINUTE",
            Granularity::ThirtyMinute => "THIRTY_MINUTE",
            Granularity::OneHour => "ONE_HOUR",
            Granularity::TwoHour => "TWO_HOUR",
            Granularity::SixHour => "SIX_HOUR",
            Granularity::OneDay => "ONE_DAY",
            Granularity::Other(label) => label,
        }
    }

    /// Span of a single request window.
    ///
    /// Chosen so that one window stays under the exchange's per-call candle cap
    /// (300 rows on Coinbase) for the row density of each granularity.
    pub fn chunk_span(&self) -> ChunkSpan {
        match self {
            Granularity::OneMinute
            | Granularity::FiveMinute
            | Granularity::FifteenMinute
            | Granularity::OneHour => ChunkSpan::Days(1),
            Granularity::SixHour => ChunkSpan::Days(5),
            Granularity::OneDay => ChunkSpan::Months(1),
            Granularity::ThirtyMinute | Granularity::TwoHour | Granularity::Other(_) => {
                ChunkSpan::Days(1)
            }
        }
    }
}

impl From<String> for Granularity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "ONE_MINUTE" => Granularity::OneMinute,
            "FIVE_MINUTE" => Granularity::FiveMinute,
            "FIFTEEN_MINUTE" => Granularity::FifteenMinute,
            "THIRTY_MINUTE" => Granularity::ThirtyMinute,
            "ONE_HOUR" => Granularity::OneHour,
            "TWO_HOUR" => Granularity::TwoHour,
            "SIX_HOUR" => Granularity::SixHour,
            "ONE_DAY" => Granularity::OneDay,
            _ => Granularity::Other(label),
        }
    }
}

impl From<Granularity> for String {
    fn from(g: Granularity) -> Self {
        match g {
            Granularity::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl FromStr for Granularity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Granularity::from(s.to_string()))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
