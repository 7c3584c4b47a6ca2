//! Aggregates endpoints — previous close, daily bars, underlying price.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::client::{FetchResult, PolygonClient};
use crate::constants::aggregates::FALLBACK_LOOKBACK_DAYS;
use crate::error::FetchError;
use crate::types::aggregates::*;

impl PolygonClient {
    /// Retrieve the previous trading day's OHLC bar for a ticker.
    ///
    /// **Endpoint:** `GET /v2/aggs/ticker/{ticker}/prev`
    pub async fn get_previous_close(&self, ticker: &str) -> FetchResult<AggregatesResponse> {
        self.get(
            &format!("/v2/aggs/ticker/{ticker}/prev"),
            &[("adjusted", "true".to_owned())],
        )
        .await
    }

    /// Retrieve daily bars for a ticker between two dates (inclusive).
    ///
    /// **Endpoint:** `GET /v2/aggs/ticker/{ticker}/range/1/day/{from}/{to}`
    pub async fn get_daily_aggregates(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FetchResult<AggregatesResponse> {
        self.get(
            &format!("/v2/aggs/ticker/{ticker}/range/1/day/{from}/{to}"),
            &[
                ("adjusted", "true".to_owned()),
                ("sort", "asc".to_owned()),
            ],
        )
        .await
    }

    /// Latest known trade price of the underlying.
    ///
    /// Uses the previous close, falling back to the most recent daily bar of
    /// the last few calendar days when the previous-close bar is missing.
    pub async fn get_underlying_price(&self, ticker: &str) -> FetchResult<Decimal> {
        let prev = self.get_previous_close(ticker).await?;
        let bar = match prev.results.into_iter().last() {
            Some(bar) => bar,
            None => {
                let to = Utc::now().date_naive() - Duration::days(1);
                let from = to - Duration::days(FALLBACK_LOOKBACK_DAYS - 1);
                tracing::debug!(%ticker, %from, %to, "no previous close, falling back to daily bars");
                self.get_daily_aggregates(ticker, from, to)
                    .await?
                    .results
                    .into_iter()
                    .last()
                    .ok_or_else(|| {
                        FetchError::EmptyResponse(format!("no price bars available for {ticker}"))
                    })?
            }
        };

        if bar.close <= Decimal::ZERO {
            return Err(FetchError::Malformed(format!(
                "non-positive close {} for {ticker}",
                bar.close
            )));
        }
        Ok(bar.close)
    }
}
