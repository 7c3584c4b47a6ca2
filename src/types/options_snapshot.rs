#![allow(missing_docs)]
//! Options chain snapshot types — contract details, open interest, day bar.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::SortOrder;
use crate::constants::options_snapshot::PAGE_LIMIT;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Query parameters for `GET /v3/snapshot/options/{underlying}`.
#[derive(Debug, Clone)]
pub struct OptionsChainQuery {
    /// Only contracts expiring on this date.
    pub expiration_date: Option<NaiveDate>,
    /// Only contracts expiring on or after this date.
    pub expiration_date_gte: Option<NaiveDate>,
    pub order: SortOrder,
    /// Results per page (max 250).
    pub limit: u32,
}

impl Default for OptionsChainQuery {
    fn default() -> Self {
        Self {
            expiration_date: None,
            expiration_date_gte: None,
            order: SortOrder::Asc,
            limit: PAGE_LIMIT,
        }
    }
}

impl OptionsChainQuery {
    /// Encode as query-string pairs. Results are always sorted by expiration.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", "expiration_date".to_owned()),
            ("order", self.order.as_str().to_owned()),
            ("limit", self.limit.min(PAGE_LIMIT).to_string()),
        ];
        if let Some(date) = self.expiration_date {
            pairs.push(("expiration_date", date.to_string()));
        }
        if let Some(date) = self.expiration_date_gte {
            pairs.push(("expiration_date.gte", date.to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Static contract attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractDetails {
    /// `"call"`, `"put"` or, rarely, `"other"`.
    pub contract_type: String,
    #[serde(default)]
    pub exercise_style: Option<String>,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub shares_per_contract: Option<u32>,
    pub strike_price: Decimal,
    /// OCC-style contract ticker (e.g. `O:SPY240119C00450000`).
    pub ticker: String,
}

/// Session statistics for a contract.
#[derive(Debug, Clone, Deserialize)]
pub struct DayBar {
    #[serde(default)]
    pub close: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// One contract in the snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionSnapshot {
    #[serde(default)]
    pub details: Option<ContractDetails>,
    #[serde(default)]
    pub open_interest: Option<u64>,
    #[serde(default)]
    pub day: Option<DayBar>,
}

/// Response page from `GET /v3/snapshot/options/{underlying}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionsChainPage {
    pub status: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub results: Vec<OptionSnapshot>,
    /// Absolute URL of the next page, if any.
    #[serde(default)]
    pub next_url: Option<String>,
}
