//! Synthetic chains for running without provider credentials.
//!
//! The generated chain has four weekly Friday expirations followed by three
//! roughly monthly ones, strikes within ±10% of the price, and open interest
//! that grows for in-the-money strikes. The nearest expiration also gets
//! extra open interest around the money.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::chain::{ChainSnapshot, Contract};
use crate::client::FetchResult;
use crate::error::FetchError;
use crate::fetcher::ChainFetcher;
use crate::types::ContractType;

/// [`ChainFetcher`] that fabricates a plausible chain around a fixed price.
#[derive(Debug)]
pub struct DemoChainFetcher {
    underlying_price: Decimal,
    timezone: Tz,
    rng: Mutex<StdRng>,
}

impl DemoChainFetcher {
    /// A fetcher seeded from OS entropy.
    pub fn new(underlying_price: Decimal, timezone: Tz) -> Self {
        Self::with_rng(underlying_price, timezone, StdRng::from_os_rng())
    }

    /// A fetcher whose output is fully determined by `seed` and the date.
    pub fn seeded(underlying_price: Decimal, timezone: Tz, seed: u64) -> Self {
        Self::with_rng(underlying_price, timezone, StdRng::seed_from_u64(seed))
    }

    fn with_rng(underlying_price: Decimal, timezone: Tz, rng: StdRng) -> Self {
        Self {
            underlying_price,
            timezone,
            rng: Mutex::new(rng),
        }
    }

    /// Build the chain for `trade_date`.
    pub fn generate(&self, ticker: &str, trade_date: NaiveDate) -> FetchResult<Vec<Contract>> {
        let price = self
            .underlying_price
            .to_f64()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| FetchError::Malformed(format!("invalid demo price {}", self.underlying_price)))?;

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| FetchError::Malformed("demo generator state poisoned".to_owned()))?;

        let expirations = expiration_dates(trade_date);
        let interval = strike_interval(price);
        let strikes = strike_ladder(price, interval);
        let key_strikes: Vec<i64> = [price, price - 5.0, price + 5.0]
            .iter()
            .map(|p| (p / interval).round() as i64)
            .collect();

        let mut contracts = Vec::with_capacity(expirations.len() * strikes.len() * 2);
        for (i, &expiration) in expirations.iter().enumerate() {
            for &steps in &strikes {
                let strike = steps as f64 * interval;
                let distance_pct = (strike - price).abs() / price;

                let call_base = rng.random_range(500..5000) as f64;
                let call_oi = if strike < price {
                    call_base * (1.0 + (price - strike) / price)
                } else {
                    call_base * (1.0 - distance_pct * 2.0).max(0.1)
                };
                let call_oi = jitter(&mut rng, call_oi);

                let put_base = rng.random_range(500..5000) as f64;
                let put_oi = if strike > price {
                    put_base * (1.0 + (strike - price) / price)
                } else {
                    put_base * (1.0 - distance_pct * 2.0).max(0.1)
                };
                let put_oi = jitter(&mut rng, put_oi * 1.2);

                let boost = if i == 0 && key_strikes.contains(&steps) {
                    rng.random_range(1.5..2.5)
                } else {
                    1.0
                };

                let strike = Decimal::from(steps * interval as i64);
                contracts.push(demo_contract(
                    ticker,
                    Contract::call(strike, (call_oi as f64 * boost) as u64, expiration),
                ));
                contracts.push(demo_contract(
                    ticker,
                    Contract::put(strike, (put_oi as f64 * boost) as u64, expiration),
                ));
            }
        }
        Ok(contracts)
    }
}

#[async_trait]
impl ChainFetcher for DemoChainFetcher {
    async fn fetch_chain(&self, ticker: &str, expirations: usize) -> FetchResult<ChainSnapshot> {
        let fetched_at = Utc::now();
        let trade_date = fetched_at.with_timezone(&self.timezone).date_naive();

        let mut contracts = self.generate(ticker, trade_date)?;
        let kept: Vec<NaiveDate> = expiration_dates(trade_date)
            .into_iter()
            .take(expirations.max(1))
            .collect();
        contracts.retain(|c| kept.contains(&c.expiration));

        tracing::info!(%ticker, contracts = contracts.len(), "generated demo options chain");
        Ok(ChainSnapshot::new(
            ticker,
            self.underlying_price,
            fetched_at,
            trade_date,
            kept,
            contracts,
        ))
    }
}

/// Four weekly Fridays starting with the nearest one, then three dates at
/// 30-day steps.
fn expiration_dates(trade_date: NaiveDate) -> Vec<NaiveDate> {
    let days_to_friday = (Weekday::Fri.num_days_from_monday() as i64
        - trade_date.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let first_friday = trade_date + Duration::days(days_to_friday);

    let mut dates: Vec<NaiveDate> = (0..4)
        .map(|week| first_friday + Duration::weeks(week))
        .collect();
    dates.extend((1..=3).map(|month| trade_date + Duration::days(30 * month)));
    dates.sort_unstable();
    dates.dedup();
    dates
}

fn strike_interval(price: f64) -> f64 {
    if price < 100.0 {
        1.0
    } else if price < 500.0 {
        5.0
    } else {
        10.0
    }
}

/// Strikes as multiples of `interval` spanning ±10% of `price`.
fn strike_ladder(price: f64, interval: f64) -> Vec<i64> {
    let lo = (price * 0.9 / interval).floor() as i64;
    let hi = (price * 1.1 / interval).floor() as i64;
    (lo..=hi).collect()
}

fn jitter(rng: &mut StdRng, oi: f64) -> u64 {
    (oi as i64 + rng.random_range(-200..=200)).max(0) as u64
}

fn demo_contract(ticker: &str, mut contract: Contract) -> Contract {
    let side = match contract.side {
        ContractType::Call => 'C',
        ContractType::Put => 'P',
    };
    let millis = (contract.strike * Decimal::ONE_THOUSAND).to_u64().unwrap_or(0);
    contract.symbol = Some(format!(
        "O:{ticker}{}{side}{millis:08}",
        contract.expiration.format("%y%m%d")
    ));
    contract
}
