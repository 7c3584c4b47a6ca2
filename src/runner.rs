//! Fetch → calculate → write, once or on a daily schedule.

use std::future::Future;

use chrono::NaiveDate;

use crate::calculator::{MaxPainCalculator, MaxPainResult};
use crate::chain::ChainSnapshot;
use crate::config::Config;
use crate::error::{FetchError, MaxPainError, Result};
use crate::fetcher::ChainFetcher;
use crate::report::{ReportWriter, RunReport};
use crate::scheduler::{Clock, Schedule};

/// Drives one ticker through the whole pipeline.
#[derive(Debug)]
pub struct Runner<F> {
    fetcher: F,
    calculator: MaxPainCalculator,
    writer: ReportWriter,
    schedule: Schedule,
    ticker: String,
    expirations: usize,
    min_expiration_oi: u64,
}

impl<F: ChainFetcher> Runner<F> {
    pub fn new(fetcher: F, config: &Config) -> Self {
        Self {
            fetcher,
            calculator: MaxPainCalculator::new(config.calculator_params()),
            writer: ReportWriter::new(config.data_dir.clone(), config.market_timezone),
            schedule: config.schedule(),
            ticker: config.ticker.clone(),
            expirations: config.expirations,
            min_expiration_oi: config.min_expiration_oi,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// One complete run, regardless of the day of the week.
    ///
    /// Expirations without usable open interest are skipped; the run only
    /// fails on them when no expiration produced a result.
    pub async fn run_once(&self) -> Result<RunReport> {
        tracing::info!(ticker = %self.ticker, expirations = self.expirations, "starting run");

        let snapshot = self
            .fetcher
            .fetch_chain(&self.ticker, self.expirations)
            .await?;
        let results = self.calculate(&snapshot)?;

        let report = RunReport::new(&snapshot, results);
        let written = self.writer.write(&report)?;

        for r in &report.results {
            tracing::info!(
                ticker = %r.ticker,
                expiration = %r.expiration,
                max_pain = %r.max_pain_strike,
                price = %r.current_price,
                distance_pct = %r.distance_percent,
                "max pain"
            );
        }
        tracing::info!(report = %written.report.display(), "run complete");
        Ok(report)
    }

    /// Run at every trigger of the schedule until `shutdown` resolves.
    ///
    /// A failed run is logged and the loop waits for the next trigger.
    /// Resolving `shutdown` while waiting or mid-run returns `Ok(())`; an
    /// interrupted run never reaches the writer.
    pub async fn run_daemon<C, S>(&self, clock: &C, shutdown: S) -> Result<()>
    where
        C: Clock + ?Sized,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            ticker = %self.ticker,
            run_at = %self.schedule.run_at(),
            timezone = %self.schedule.timezone(),
            "daemon started"
        );

        loop {
            let next = self.schedule.next_trigger(clock.now());
            tracing::info!(
                next_run = %next.with_timezone(&self.schedule.timezone()),
                "waiting for next trigger"
            );

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping daemon");
                    return Ok(());
                }
                () = clock.sleep_until(next) => {}
            }

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::warn!("shutdown requested during run, stopping daemon");
                    return Ok(());
                }
                outcome = self.run_once() => {
                    if let Err(e) = outcome {
                        tracing::error!(ticker = %self.ticker, error = %e, "scheduled run failed");
                    }
                }
            }
        }
    }

    fn calculate(&self, snapshot: &ChainSnapshot) -> Result<Vec<MaxPainResult>> {
        if self.min_expiration_oi > 0 {
            match snapshot.nearest_liquid_expiration(self.min_expiration_oi) {
                Some(expiration) => {
                    tracing::debug!(%expiration, min_oi = self.min_expiration_oi, "nearest liquid expiration");
                }
                None => {
                    let expiration = snapshot
                        .expirations()
                        .next()
                        .unwrap_or(snapshot.trade_date());
                    return Err(MaxPainError::NoContracts { expiration });
                }
            }
        }

        let mut results = Vec::new();
        let mut first_error: Option<MaxPainError> = None;
        for (expiration, outcome) in self.calculator.compute_all(snapshot) {
            if self.is_illiquid(snapshot, expiration) {
                tracing::warn!(
                    %expiration,
                    open_interest = snapshot.open_interest_for(expiration),
                    min_oi = self.min_expiration_oi,
                    "skipping illiquid expiration"
                );
                continue;
            }
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(%expiration, error = %e, "skipping expiration");
                    first_error.get_or_insert(e);
                }
            }
        }

        if results.is_empty() {
            return Err(first_error.unwrap_or_else(|| {
                FetchError::EmptyResponse(format!("no expirations in chain for {}", self.ticker)).into()
            }));
        }
        Ok(results)
    }

    fn is_illiquid(&self, snapshot: &ChainSnapshot, expiration: NaiveDate) -> bool {
        self.min_expiration_oi > 0 && snapshot.open_interest_for(expiration) <= self.min_expiration_oi
    }
}
