//! Max-pain calculation over a [`ChainSnapshot`].
//!
//! For every distinct strike `K` of an expiration the aggregate pain is the
//! intrinsic value option holders would collect if the underlying settled
//! at `K`:
//!
//! ```text
//! pain(K) = Σ calls, S ≤ K: (K − S) · OI · multiplier
//!         + Σ puts,  S ≥ K: (S − K) · OI · multiplier
//! ```
//!
//! The max-pain strike is the argmin of that curve, ties going to the
//! lowest strike. Everything here is pure: the same snapshot always yields
//! the same [`MaxPainResult`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::ChainSnapshot;
use crate::constants::{
    DEFAULT_CONTRACT_MULTIPLIER, DEFAULT_NEARBY_RADIUS, DISTANCE_PERCENT_DP, PUT_CALL_RATIO_DP,
};
use crate::error::{MaxPainError, Result};
use crate::types::ContractType;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunables of the calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorParams {
    /// Shares of the underlying per contract.
    pub contract_multiplier: Decimal,
    /// Strikes reported on either side of the one closest to the current price.
    pub nearby_radius: usize,
}

impl Default for CalculatorParams {
    fn default() -> Self {
        Self {
            contract_multiplier: Decimal::from(DEFAULT_CONTRACT_MULTIPLIER),
            nearby_radius: DEFAULT_NEARBY_RADIUS,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Aggregate holder payout if the underlying settles at `strike`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainPoint {
    pub strike: Decimal,
    pub pain: Decimal,
}

/// One row of the nearby-strike window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearbyStrike {
    pub strike: Decimal,
    pub pain: Decimal,
    pub is_max_pain: bool,
}

/// Max-pain outcome for one expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPainResult {
    pub ticker: String,
    pub expiration: NaiveDate,
    /// Calendar days from the snapshot's trade date.
    pub days_to_expiration: i64,
    /// Fetch time of the snapshot the result was derived from.
    pub calculated_at: DateTime<Utc>,
    pub current_price: Decimal,
    pub max_pain_strike: Decimal,
    pub max_pain_value: Decimal,
    /// `current_price − max_pain_strike`.
    pub distance: Decimal,
    /// `distance` as a percentage of `current_price`.
    pub distance_percent: Decimal,
    /// Total put OI ÷ total call OI; `None` when there is no call open interest.
    pub put_call_ratio: Option<Decimal>,
    pub total_put_oi: u64,
    pub total_call_oi: u64,
    /// Contracts with non-zero open interest.
    pub contracts_analyzed: usize,
    pub strikes_analyzed: usize,
    pub contract_multiplier: Decimal,
    pub nearby_strikes: Vec<NearbyStrike>,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct StrikeOpenInterest {
    call: u64,
    put: u64,
}

/// Computes max pain for the expirations of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct MaxPainCalculator {
    params: CalculatorParams,
}

impl MaxPainCalculator {
    pub fn new(params: CalculatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CalculatorParams {
        &self.params
    }

    /// Pain at every distinct strike of `expiration`, ascending by strike.
    pub fn pain_curve(&self, chain: &ChainSnapshot, expiration: NaiveDate) -> Result<Vec<PainPoint>> {
        let by_strike = open_interest_by_strike(chain, expiration)?;
        self.curve_from(&by_strike)
            .ok_or(MaxPainError::Overflow { expiration })
    }

    /// Max pain, put/call ratio, distance and the nearby-strike window for
    /// one expiration.
    ///
    /// Fails with [`MaxPainError::InvalidExpiration`] when the snapshot does
    /// not contain `expiration`, and with [`MaxPainError::NoContracts`] when
    /// it has no contracts with open interest for it.
    pub fn compute(&self, chain: &ChainSnapshot, expiration: NaiveDate) -> Result<MaxPainResult> {
        let by_strike = open_interest_by_strike(chain, expiration)?;
        let curve = self
            .curve_from(&by_strike)
            .ok_or(MaxPainError::Overflow { expiration })?;

        let max_pain = curve
            .iter()
            .copied()
            .reduce(|best, p| if p.pain < best.pain { p } else { best })
            .ok_or(MaxPainError::NoContracts { expiration })?;

        let total_call_oi = checked_total(by_strike.values().map(|oi| oi.call))
            .ok_or(MaxPainError::Overflow { expiration })?;
        let total_put_oi = checked_total(by_strike.values().map(|oi| oi.put))
            .ok_or(MaxPainError::Overflow { expiration })?;
        let put_call_ratio = (total_call_oi > 0).then(|| {
            (Decimal::from(total_put_oi) / Decimal::from(total_call_oi))
                .round_dp(PUT_CALL_RATIO_DP)
                .normalize()
        });

        let current_price = chain.underlying_price();
        let distance = current_price - max_pain.strike;
        let distance_percent = if current_price.is_zero() {
            Decimal::ZERO
        } else {
            (distance / current_price * Decimal::ONE_HUNDRED)
                .round_dp(DISTANCE_PERCENT_DP)
                .normalize()
        };

        let contracts_analyzed = chain
            .contracts_for(expiration)
            .filter(|c| c.open_interest > 0)
            .count();

        let nearby_strikes =
            nearby_window(&curve, current_price, self.params.nearby_radius, max_pain.strike);

        let result = MaxPainResult {
            ticker: chain.ticker().to_owned(),
            expiration,
            days_to_expiration: (expiration - chain.trade_date()).num_days(),
            calculated_at: chain.fetched_at(),
            current_price,
            max_pain_strike: max_pain.strike,
            max_pain_value: max_pain.pain,
            distance,
            distance_percent,
            put_call_ratio,
            total_put_oi,
            total_call_oi,
            contracts_analyzed,
            strikes_analyzed: curve.len(),
            contract_multiplier: self.params.contract_multiplier,
            nearby_strikes,
        };

        tracing::debug!(
            ticker = %result.ticker,
            %expiration,
            max_pain = %result.max_pain_strike,
            strikes = result.strikes_analyzed,
            "max pain computed"
        );
        Ok(result)
    }

    /// [`compute`](Self::compute) for every expiration of the snapshot, ascending.
    pub fn compute_all(&self, chain: &ChainSnapshot) -> Vec<(NaiveDate, Result<MaxPainResult>)> {
        chain
            .expirations()
            .map(|expiration| (expiration, self.compute(chain, expiration)))
            .collect()
    }

    /// `None` when a pain sum overflows.
    fn curve_from(&self, by_strike: &BTreeMap<Decimal, StrikeOpenInterest>) -> Option<Vec<PainPoint>> {
        by_strike
            .keys()
            .map(|&settle| {
                let mut payout = Decimal::ZERO;
                for (&strike, oi) in by_strike {
                    if strike <= settle {
                        let call = (settle - strike).checked_mul(Decimal::from(oi.call))?;
                        payout = payout.checked_add(call)?;
                    }
                    if strike >= settle {
                        let put = (strike - settle).checked_mul(Decimal::from(oi.put))?;
                        payout = payout.checked_add(put)?;
                    }
                }
                Some(PainPoint {
                    strike: settle,
                    pain: payout.checked_mul(self.params.contract_multiplier)?.normalize(),
                })
            })
            .collect()
    }
}

fn checked_total(mut values: impl Iterator<Item = u64>) -> Option<u64> {
    values.try_fold(0u64, u64::checked_add)
}

/// Open interest per distinct strike of one expiration.
fn open_interest_by_strike(
    chain: &ChainSnapshot,
    expiration: NaiveDate,
) -> Result<BTreeMap<Decimal, StrikeOpenInterest>> {
    if !chain.has_expiration(expiration) {
        return Err(MaxPainError::InvalidExpiration { expiration });
    }

    let mut by_strike: BTreeMap<Decimal, StrikeOpenInterest> = BTreeMap::new();
    for contract in chain.contracts_for(expiration) {
        let entry = by_strike.entry(contract.strike.normalize()).or_default();
        let side = match contract.side {
            ContractType::Call => &mut entry.call,
            ContractType::Put => &mut entry.put,
        };
        *side = side
            .checked_add(contract.open_interest)
            .ok_or(MaxPainError::Overflow { expiration })?;
    }

    if by_strike.values().all(|oi| oi.call == 0 && oi.put == 0) {
        return Err(MaxPainError::NoContracts { expiration });
    }
    Ok(by_strike)
}

/// The strike closest to `price` (lower one on a tie) and up to `radius`
/// strikes on each side.
fn nearby_window(
    curve: &[PainPoint],
    price: Decimal,
    radius: usize,
    max_pain_strike: Decimal,
) -> Vec<NearbyStrike> {
    let Some(anchor) = curve
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (p.strike - price).abs())
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let lo = anchor.saturating_sub(radius);
    let hi = anchor.saturating_add(radius).saturating_add(1).min(curve.len());
    curve[lo..hi]
        .iter()
        .map(|p| NearbyStrike {
            strike: p.strike,
            pain: p.pain,
            is_max_pain: p.strike == max_pain_strike,
        })
        .collect()
}
