//! Domain model of a fetched options chain.
//!
//! A [`ChainSnapshot`] is the immutable input of the max-pain calculation:
//! every [`Contract`] of one underlying at one fetch instant, together with
//! the underlying's price.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ContractType;

/// One option series at a given strike, side and expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub strike: Decimal,
    pub open_interest: u64,
    pub side: ContractType,
    pub expiration: NaiveDate,
    /// Provider contract ticker, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<Decimal>,
}

impl Contract {
    /// A contract with just the attributes the calculation needs.
    pub fn new(side: ContractType, strike: Decimal, open_interest: u64, expiration: NaiveDate) -> Self {
        Self {
            strike,
            open_interest,
            side,
            expiration,
            symbol: None,
            volume: None,
            last_price: None,
        }
    }

    pub fn call(strike: Decimal, open_interest: u64, expiration: NaiveDate) -> Self {
        Self::new(ContractType::Call, strike, open_interest, expiration)
    }

    pub fn put(strike: Decimal, open_interest: u64, expiration: NaiveDate) -> Self {
        Self::new(ContractType::Put, strike, open_interest, expiration)
    }
}

/// All contracts of one underlying captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    ticker: String,
    underlying_price: Decimal,
    fetched_at: DateTime<Utc>,
    trade_date: NaiveDate,
    expirations: BTreeSet<NaiveDate>,
    contracts: Vec<Contract>,
}

impl ChainSnapshot {
    /// Build a snapshot. The expiration set is `listed` plus every
    /// expiration carried by a contract.
    ///
    /// `trade_date` is the market-local date of `fetched_at`; it anchors
    /// days-to-expiration.
    pub fn new(
        ticker: impl Into<String>,
        underlying_price: Decimal,
        fetched_at: DateTime<Utc>,
        trade_date: NaiveDate,
        listed: impl IntoIterator<Item = NaiveDate>,
        contracts: Vec<Contract>,
    ) -> Self {
        let mut expirations: BTreeSet<NaiveDate> = listed.into_iter().collect();
        expirations.extend(contracts.iter().map(|c| c.expiration));
        Self {
            ticker: ticker.into(),
            underlying_price,
            fetched_at,
            trade_date,
            expirations,
            contracts,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn underlying_price(&self) -> Decimal {
        self.underlying_price
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    /// Expirations covered by this snapshot, ascending.
    pub fn expirations(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.expirations.iter().copied()
    }

    pub fn has_expiration(&self, expiration: NaiveDate) -> bool {
        self.expirations.contains(&expiration)
    }

    /// Contracts expiring on `expiration`, in snapshot order.
    pub fn contracts_for(&self, expiration: NaiveDate) -> impl Iterator<Item = &Contract> + '_ {
        self.contracts
            .iter()
            .filter(move |c| c.expiration == expiration)
    }

    /// Total open interest across both sides of one expiration.
    pub fn open_interest_for(&self, expiration: NaiveDate) -> u64 {
        self.contracts_for(expiration)
            .fold(0, |total: u64, c| total.saturating_add(c.open_interest))
    }

    /// The earliest expiration on or after the trade date whose total open
    /// interest exceeds `min_total_oi`.
    pub fn nearest_liquid_expiration(&self, min_total_oi: u64) -> Option<NaiveDate> {
        self.expirations()
            .filter(|exp| *exp >= self.trade_date)
            .find(|exp| self.open_interest_for(*exp) > min_total_oi)
    }
}
