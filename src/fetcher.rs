//! Chain fetchers: turn a provider's options snapshot into a [`ChainSnapshot`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::chain::{ChainSnapshot, Contract};
use crate::client::{FetchResult, PolygonClient};
use crate::constants::options_snapshot::MAX_PAGES;
use crate::error::FetchError;
use crate::types::ContractType;
use crate::types::options_snapshot::{OptionSnapshot, OptionsChainQuery};

/// Source of chain snapshots.
#[async_trait]
pub trait ChainFetcher: Send + Sync {
    /// Snapshot of `ticker` covering its nearest `expirations` non-expired
    /// expiration dates.
    async fn fetch_chain(&self, ticker: &str, expirations: usize) -> FetchResult<ChainSnapshot>;
}

/// [`ChainFetcher`] backed by the Polygon.io options snapshot endpoint.
#[derive(Debug, Clone)]
pub struct PolygonChainFetcher {
    client: PolygonClient,
    timezone: Tz,
    contract_multiplier: Decimal,
}

impl PolygonChainFetcher {
    /// `timezone` decides which expirations count as expired;
    /// `contract_multiplier` is only used to flag contracts with a
    /// non-standard deliverable.
    pub fn new(client: PolygonClient, timezone: Tz, contract_multiplier: Decimal) -> Self {
        Self {
            client,
            timezone,
            contract_multiplier,
        }
    }

    pub fn client(&self) -> &PolygonClient {
        &self.client
    }

    /// Convert one snapshot entry, skipping entries the calculation can't use.
    fn to_contract(&self, entry: OptionSnapshot) -> Option<Contract> {
        let Some(details) = entry.details else {
            tracing::debug!("skipping snapshot entry without contract details");
            return None;
        };
        let side = match details.contract_type.parse::<ContractType>() {
            Ok(side) => side,
            Err(reason) => {
                tracing::debug!(contract = %details.ticker, %reason, "skipping contract");
                return None;
            }
        };
        if let Some(shares) = details.shares_per_contract {
            if Decimal::from(shares) != self.contract_multiplier {
                tracing::warn!(
                    contract = %details.ticker,
                    shares,
                    multiplier = %self.contract_multiplier,
                    "contract deliverable differs from configured multiplier"
                );
            }
        }

        let day = entry.day;
        Some(Contract {
            strike: details.strike_price,
            open_interest: entry.open_interest.unwrap_or(0),
            side,
            expiration: details.expiration_date,
            symbol: Some(details.ticker),
            volume: day.as_ref().and_then(|d| d.volume).map(|v| v.max(0.0) as u64),
            last_price: day.and_then(|d| d.close),
        })
    }
}

#[async_trait]
impl ChainFetcher for PolygonChainFetcher {
    async fn fetch_chain(&self, ticker: &str, expirations: usize) -> FetchResult<ChainSnapshot> {
        let wanted = expirations.max(1);
        let fetched_at = Utc::now();
        let trade_date = fetched_at.with_timezone(&self.timezone).date_naive();

        let price = self.client.get_underlying_price(ticker).await?;
        tracing::info!(%ticker, %price, "fetched underlying price");

        let query = OptionsChainQuery {
            expiration_date_gte: Some(trade_date),
            ..OptionsChainQuery::default()
        };
        let mut page = self.client.get_options_chain(ticker, &query).await?;

        let mut seen: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut contracts = Vec::new();
        let mut pages = 1;
        let mut truncated = false;
        'pages: loop {
            for entry in page.results {
                let Some(contract) = self.to_contract(entry) else {
                    continue;
                };
                if contract.expiration < trade_date {
                    continue;
                }
                if !seen.contains(&contract.expiration) && seen.len() == wanted {
                    tracing::debug!(%ticker, pages, "past requested expirations, stopping early");
                    break 'pages;
                }
                seen.insert(contract.expiration);
                contracts.push(contract);
            }

            match page.next_url {
                Some(next) if pages < MAX_PAGES => {
                    page = self.client.get_options_chain_next(&next).await?;
                    pages += 1;
                }
                Some(_) => {
                    truncated = true;
                    break;
                }
                None => break,
            }
        }

        // The last expiration seen may continue past the cap.
        if truncated {
            if let Some(partial) = seen.pop_last() {
                contracts.retain(|c| c.expiration != partial);
                tracing::warn!(%ticker, pages, expiration = %partial, "page cap reached, dropping partial expiration");
            }
            if seen.is_empty() {
                return Err(FetchError::Malformed(format!(
                    "chain for {ticker} truncated at {MAX_PAGES} pages"
                )));
            }
        }

        if contracts.is_empty() {
            return Err(FetchError::EmptyResponse(format!(
                "no option contracts returned for {ticker}"
            )));
        }

        tracing::info!(
            %ticker,
            contracts = contracts.len(),
            expirations = seen.len(),
            pages,
            "fetched options chain"
        );
        Ok(ChainSnapshot::new(
            ticker,
            price,
            fetched_at,
            trade_date,
            seen,
            contracts,
        ))
    }
}
