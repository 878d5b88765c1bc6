//! Turns raw API candles into tagged rows and checks them against the requested window.

use crate::data::RawCandle;
use crate::granularity::Granularity;
use crate::progress::{DateSpan, ExportObserver};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One exported candle, tagged with the pair it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRow {
    pub instrument: String,
    pub granularity: Granularity,
    pub start: DateTime<Utc>,
    pub start_unix: i64,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

/// Uniqueness key of a row within an export.
pub type CandleKey = (String, Granularity, i64);

impl CandleRow {
    pub fn key(&self) -> CandleKey {
        (self.instrument.clone(), self.granularity.clone(), self.start_unix)
    }
}

/// Map raw candles to [`CandleRow`]s, in the order the API returned them.
///
/// When the first or last observed day differs from the requested window's
/// first or last day, a range mismatch is reported. The rows are kept as-is
/// either way: exchanges return partial windows near range boundaries and in
/// quiet markets.
pub fn normalize(
    raw: &[RawCandle],
    instrument: &str,
    granularity: &Granularity,
    expected: DateSpan,
    observer: &dyn ExportObserver,
) -> Vec<CandleRow> {
    let rows: Vec<CandleRow> = raw
        .iter()
        .filter_map(|c| {
            let Some(start) = DateTime::from_timestamp(c.start, 0) else {
                observer.on_invalid_timestamp(instrument, granularity, c.start);
                return None;
            };
            Some(CandleRow {
                instrument: instrument.to_string(),
                granularity: granularity.clone(),
                start,
                start_unix: c.start,
                low: c.low,
                high: c.high,
                open: c.open,
                close: c.close,
                volume: c.volume,
            })
        })
        .collect();

    let (Some(min), Some(max)) = (
        rows.iter().map(|r| r.start).min(),
        rows.iter().map(|r| r.start).max(),
    ) else {
        return rows;
    };

    let observed = DateSpan { start: min, end: max };
    observer.on_candles_received(instrument, granularity, rows.len(), observed);

    if min.date_naive() != expected.start.date_naive()
        || max.date_naive() != expected.end.date_naive()
    {
        observer.on_range_mismatch(instrument, granularity, expected, observed);
    }

    rows
}
