//! Coinbase Advanced Trade public candles adapter.
//!
//! Thin blocking wrapper over `GET /api/v3/brokerage/market/products/{id}/candles`.
//! It performs exactly one request per call; retries and pacing belong to the
//! fetcher and the export loop.

use super::provider::{CandleProvider, FetchError, RawCandle};
use crate::granularity::Granularity;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coinbase.com";

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<ApiCandle>,
}

#[derive(Debug, Deserialize)]
struct ApiCandle {
    start: ApiNumber,
    low: ApiNumber,
    high: ApiNumber,
    open: ApiNumber,
    close: ApiNumber,
    volume: ApiNumber,
}

/// Coinbase encodes numbers as strings; accept plain JSON numbers as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ApiNumber {
    fn as_f64(&self, field: &str) -> Result<f64, FetchError> {
        match self {
            ApiNumber::Int(v) => Ok(*v as f64),
            ApiNumber::Float(v) => Ok(*v),
            ApiNumber::Text(s) => s.trim().parse().map_err(|_| {
                FetchError::ResponseFormatChanged(format!("{field} is not numeric: {s:?}"))
            }),
        }
    }

    fn as_i64(&self, field: &str) -> Result<i64, FetchError> {
        match self {
            ApiNumber::Int(v) => Ok(*v),
            ApiNumber::Float(v) if v.fract() == 0.0 => Ok(*v as i64),
            ApiNumber::Float(v) => Err(FetchError::ResponseFormatChanged(format!(
                "{field} is not a whole number: {v}"
            ))),
            ApiNumber::Text(s) => s.trim().parse().map_err(|_| {
                FetchError::ResponseFormatChanged(format!("{field} is not an integer: {s:?}"))
            }),
        }
    }
}

/// Decode a candles response body into raw rows.
pub fn parse_candles(body: &str) -> Result<Vec<RawCandle>, FetchError> {
    let resp: CandlesResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::ResponseFormatChanged(format!("failed to parse candles: {e}")))?;

    resp.candles
        .iter()
        .map(|c| {
            Ok(RawCandle {
                start: c.start.as_i64("start")?,
                low: c.low.as_f64("low")?,
                high: c.high.as_f64("high")?,
                open: c.open.as_f64("open")?,
                close: c.close.as_f64("close")?,
                volume: c.volume.as_f64("volume")?,
            })
        })
        .collect()
}

/// Coinbase public market-data provider.
pub struct CoinbaseProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CoinbaseProvider {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("candle-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn candles_url(&self, instrument: &str) -> String {
        format!(
            "{}/api/v3/brokerage/market/products/{instrument}/candles",
            self.base_url
        )
    }
}

impl CandleProvider for CoinbaseProvider {
    fn name(&self) -> &str {
        "coinbase"
    }

    fn fetch_candles(
        &self,
        instrument: &str,
        start_unix: i64,
        end_unix: i64,
        granularity: &Granularity,
    ) -> Result<Vec<RawCandle>, FetchError> {
        let resp = self
            .client
            .get(self.candles_url(instrument))
            .query(&[
                ("start", start_unix.to_string()),
                ("end", end_unix.to_string()),
                ("granularity", granularity.label().to_string()),
            ])
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(FetchError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationRejected(format!(
                "HTTP {status} for {instrument}"
            )));
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_candles(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_encoded_candles() {
        let body = r#"{"candles":[
            {"start":"1672617600","low":"16600.1","high":"16800","open":"16620.5","close":"16700","volume":"1234.5"},
            {"start":"1672531200","low":"16500","high":"16650","open":"16550","close":"16620.5","volume":"987"}
        ]}"#;
        let candles = parse_candles(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].start, 1_672_617_600);
        assert_eq!(candles[0].low, 16600.1);
        assert_eq!(candles[1].volume, 987.0);
    }

    #[test]
    fn accepts_plain_numbers() {
        let body = r#"{"candles":[
            {"start":1672531200,"low":1,"high":2.5,"open":1.5,"close":2,"volume":10}
        ]}"#;
        let candles = parse_candles(body).unwrap();
        assert_eq!(candles[0], RawCandle::from((1_672_531_200, 1.0, 2.5, 1.5, 2.0, 10.0)));
    }

    #[test]
    fn missing_candles_key_is_empty() {
        assert!(parse_candles("{}").unwrap().is_empty());
    }

    #[test]
    fn non_numeric_field_is_format_change() {
        let body = r#"{"candles":[
            {"start":"abc","low":"1","high":"1","open":"1","close":"1","volume":"1"}
        ]}"#;
        assert!(matches!(
            parse_candles(body),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn garbage_body_is_format_change() {
        assert!(matches!(
            parse_candles("<html>"),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn url_strips_trailing_slash() {
        let provider = CoinbaseProvider::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(
            provider.candles_url("BTC-USDC"),
            "http://localhost:8080/api/v3/brokerage/market/products/BTC-USDC/candles"
        );
    }
}
