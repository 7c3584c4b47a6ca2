//! Runtime configuration, loaded from environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `POLYGON_API_KEY` | — | Provider API key (required unless running on demo data) |
//! | `TICKER` | `SPY` | Underlying symbol |
//! | `MARKET_TIMEZONE` | `America/New_York` | IANA timezone of the exchange |
//! | `RUN_AT` | `09:31` | Daily trigger time, market-local `HH:MM` |
//! | `DATA_DIR` | `data` | Output root |
//! | `LOG_DIR` | `logs` | Log file directory |
//! | `EXPIRATIONS` | `1` | Nearest expirations per run |
//! | `CONTRACT_MULTIPLIER` | `100` | Shares per contract |
//! | `NEARBY_STRIKES` | `5` | Strikes each side of the price in the report window |
//! | `MIN_EXPIRATION_OI` | `0` | Skip expirations whose total OI is at or below this |
//! | `POLYGON_BASE_URL` | `https://api.polygon.io` | Provider base URL |

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::calculator::CalculatorParams;
use crate::constants::{
    API_BASE_URL, DEFAULT_CONTRACT_MULTIPLIER, DEFAULT_DATA_DIR, DEFAULT_EXPIRATIONS,
    DEFAULT_LOG_DIR, DEFAULT_MARKET_TIMEZONE, DEFAULT_NEARBY_RADIUS, DEFAULT_RUN_AT,
    DEFAULT_TICKER,
};
use crate::error::ConfigError;
use crate::scheduler::Schedule;

/// Provider API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: Option<ApiKey>,
    pub ticker: String,
    pub market_timezone: Tz,
    pub run_at: NaiveTime,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub expirations: usize,
    pub contract_multiplier: Decimal,
    pub nearby_radius: usize,
    pub min_expiration_oi: u64,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            ticker: DEFAULT_TICKER.to_owned(),
            market_timezone: chrono_tz::America::New_York,
            run_at: NaiveTime::from_hms_opt(9, 31, 0).unwrap_or_default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            expirations: DEFAULT_EXPIRATIONS,
            contract_multiplier: Decimal::from(DEFAULT_CONTRACT_MULTIPLIER),
            nearby_radius: DEFAULT_NEARBY_RADIUS,
            min_expiration_oi: 0,
            base_url: API_BASE_URL.to_owned(),
        }
    }
}

impl Config {
    /// Create configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    /// A missing API key is only reported by [`Config::api_key`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned());

        let ticker = get("TICKER").unwrap_or_else(|| DEFAULT_TICKER.to_owned());
        if ticker.is_empty() {
            return Err(ConfigError::EmptyValue("TICKER".to_owned()));
        }

        let tz_raw = get("MARKET_TIMEZONE").unwrap_or_else(|| DEFAULT_MARKET_TIMEZONE.to_owned());
        let market_timezone = tz_raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
            key: "MARKET_TIMEZONE".to_owned(),
            value: tz_raw.clone(),
            reason: e.to_string(),
        })?;

        let run_at_raw = get("RUN_AT").unwrap_or_else(|| DEFAULT_RUN_AT.to_owned());
        let run_at = NaiveTime::parse_from_str(&run_at_raw, "%H:%M").map_err(|e| {
            ConfigError::Invalid {
                key: "RUN_AT".to_owned(),
                value: run_at_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let expirations: usize = parse_or("EXPIRATIONS", get("EXPIRATIONS"), DEFAULT_EXPIRATIONS)?;
        if expirations == 0 {
            return Err(invalid("EXPIRATIONS", "0", "must be at least 1"));
        }

        let contract_multiplier: Decimal = parse_or(
            "CONTRACT_MULTIPLIER",
            get("CONTRACT_MULTIPLIER"),
            Decimal::from(DEFAULT_CONTRACT_MULTIPLIER),
        )?;
        if contract_multiplier <= Decimal::ZERO {
            return Err(invalid(
                "CONTRACT_MULTIPLIER",
                &contract_multiplier.to_string(),
                "must be positive",
            ));
        }

        Ok(Self {
            api_key: get("POLYGON_API_KEY").filter(|k| !k.is_empty()).map(ApiKey),
            ticker: ticker.to_uppercase(),
            market_timezone,
            run_at,
            data_dir: get("DATA_DIR").map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            log_dir: get("LOG_DIR").map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from),
            expirations,
            contract_multiplier,
            nearby_radius: parse_or("NEARBY_STRIKES", get("NEARBY_STRIKES"), DEFAULT_NEARBY_RADIUS)?,
            min_expiration_oi: parse_or("MIN_EXPIRATION_OI", get("MIN_EXPIRATION_OI"), 0)?,
            base_url: get("POLYGON_BASE_URL").unwrap_or_else(|| API_BASE_URL.to_owned()),
        })
    }

    /// The provider API key.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEnvVar`] when `POLYGON_API_KEY` is unset or empty.
    pub fn api_key(&self) -> Result<&ApiKey, ConfigError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("POLYGON_API_KEY".to_owned()))
    }

    pub fn set_api_key(&mut self, key: ApiKey) {
        self.api_key = Some(key);
    }

    pub fn calculator_params(&self) -> CalculatorParams {
        CalculatorParams {
            contract_multiplier: self.contract_multiplier,
            nearby_radius: self.nearby_radius,
        }
    }

    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.run_at, self.market_timezone)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| invalid(key, &v, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
