#![allow(missing_docs)]
//! Aggregate (OHLC bar) types — previous close and daily ranges.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A single OHLC bar.
///
/// Field names follow Polygon's single-letter wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateBar {
    /// Ticker symbol (only present on previous-close responses).
    #[serde(rename = "T", default)]
    pub ticker: Option<String>,
    #[serde(rename = "o", default)]
    pub open: Option<Decimal>,
    #[serde(rename = "h", default)]
    pub high: Option<Decimal>,
    #[serde(rename = "l", default)]
    pub low: Option<Decimal>,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
    /// Bar start, Unix milliseconds.
    #[serde(rename = "t", default)]
    pub timestamp_ms: Option<i64>,
}

/// Response from `GET /v2/aggs/ticker/{ticker}/prev` and
/// `GET /v2/aggs/ticker/{ticker}/range/...`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatesResponse {
    #[serde(default)]
    pub ticker: Option<String>,
    pub status: String,
    #[serde(default)]
    pub results_count: Option<u64>,
    /// Absent when there are no bars in range.
    #[serde(default)]
    pub results: Vec<AggregateBar>,
}
