//! Export configuration: file format, defaults and load-time validation.
//!
//! The file uses PascalCase keys, all optional:
//!
//! ```json
//! {
//!   "MaxRetryAttempts": 3,
//!   "RetryDelayMilliseconds": 2000,
//!   "ProductIds": ["BTC-USDC"],
//!   "Granularities": ["ONE_DAY"],
//!   "StartDate": "2023-01-01",
//!   "EndDate": "2023-12-31"
//! }
//! ```
//!
//! Misnamed keys are rejected rather than silently ignored.

use crate::data::RetryPolicy;
use crate::granularity::Granularity;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_INSTRUMENT: &str = "BTC-USDC";
pub const DEFAULT_START_DATE: &str = "2023-01-01";
pub const DEFAULT_END_DATE: &str = "2023-12-31";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid {key}: {value:?} (expected YYYY-MM-DD or an ISO 8601 date-time)")]
    InvalidDate { key: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// On-disk shape of the configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
struct ConfigFile {
    max_retry_attempts: u32,
    retry_delay_milliseconds: u64,
    product_ids: Vec<String>,
    granularities: Vec<Granularity>,
    start_date: String,
    end_date: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_RETRIES,
            retry_delay_milliseconds: DEFAULT_RETRY_DELAY_MS,
            product_ids: vec![DEFAULT_INSTRUMENT.to_string()],
            granularities: vec![Granularity::OneDay],
            start_date: DEFAULT_START_DATE.to_string(),
            end_date: DEFAULT_END_DATE.to_string(),
        }
    }
}

/// Validated, immutable configuration for one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Total provider calls per chunk before the chunk is skipped.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub instruments: Vec<String>,
    pub granularities: Vec<Granularity>,
    /// Inclusive start of the range (midnight UTC unless a time was given).
    pub start: DateTime<Utc>,
    /// Inclusive end of the range, always 23:59:59 UTC of the end date.
    pub end: DateTime<Utc>,
}

impl ExportConfig {
    /// Load from a file; `.toml` files parse as TOML, everything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        file.validate()
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.validate()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }

    /// Number of (instrument, granularity) pairs the run will export.
    pub fn pair_count(&self) -> usize {
        self.instruments.len() * self.granularities.len()
    }
}

impl ConfigFile {
    fn validate(self) -> Result<ExportConfig, ConfigError> {
        if self.product_ids.is_empty() {
            return Err(ConfigError::Invalid("ProductIds must not be empty".into()));
        }
        if let Some(blank) = self.product_ids.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "ProductIds[{blank}] is blank"
            )));
        }
        if self.granularities.is_empty() {
            return Err(ConfigError::Invalid("Granularities must not be empty".into()));
        }

        let start = parse_config_date("StartDate", &self.start_date)?.and_utc();
        let end = parse_config_date("EndDate", &self.end_date)?
            .date()
            .and_time(end_of_day())
            .and_utc();

        if start > end {
            return Err(ConfigError::Invalid(format!(
                "StartDate {} is after EndDate {}",
                self.start_date, self.end_date
            )));
        }

        Ok(ExportConfig {
            max_retries: self.max_retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_milliseconds),
            instruments: self.product_ids,
            granularities: self.granularities,
            start,
            end,
        })
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

/// Parse `YYYY-MM-DD` (midnight) or an ISO date-time.
///
/// A trailing `Z` or UTC offset is accepted and discarded: the wall-clock
/// time is always read as UTC.
fn parse_config_date(key: &'static str, value: &str) -> Result<NaiveDateTime, ConfigError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()));
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.naive_local());
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ConfigError::InvalidDate {
            key,
            value: value.to_string(),
        })
}
