//! Constants for the Polygon.io API and max-pain defaults.
//!
//! These are used internally by [`PolygonClient`](crate::client::PolygonClient),
//! the fetchers and [`Config`](crate::config::Config), but are also exported
//! for advanced usage.

// ---------------------------------------------------------------------------
// Base URLs
// ---------------------------------------------------------------------------

/// Base URL for the Polygon.io REST API.
pub const API_BASE_URL: &str = "https://api.polygon.io";

// ---------------------------------------------------------------------------
// Provider limits
// ---------------------------------------------------------------------------

/// Options snapshot pagination limits.
pub mod options_snapshot {
    /// Maximum results per page accepted by `/v3/snapshot/options`.
    pub const PAGE_LIMIT: u32 = 250;
    /// Upper bound on pages followed for a single chain fetch.
    pub const MAX_PAGES: usize = 40;
}

/// Underlying price lookup.
pub mod aggregates {
    /// Calendar days searched backwards when the previous-close bar is missing.
    pub const FALLBACK_LOOKBACK_DAYS: i64 = 5;
}

// ---------------------------------------------------------------------------
// Max pain defaults
// ---------------------------------------------------------------------------

/// Shares represented by one standard equity option contract.
pub const DEFAULT_CONTRACT_MULTIPLIER: u32 = 100;

/// Strikes shown on either side of the one closest to the current price.
pub const DEFAULT_NEARBY_RADIUS: usize = 5;

/// Nearest expirations fetched per run.
pub const DEFAULT_EXPIRATIONS: usize = 1;

/// Decimal places kept in the put/call ratio.
pub const PUT_CALL_RATIO_DP: u32 = 3;

/// Decimal places kept in the distance percentage.
pub const DISTANCE_PERCENT_DP: u32 = 4;

// ---------------------------------------------------------------------------
// Scheduling defaults
// ---------------------------------------------------------------------------

/// Ticker analysed when none is configured.
pub const DEFAULT_TICKER: &str = "SPY";

/// IANA timezone of the exchange.
pub const DEFAULT_MARKET_TIMEZONE: &str = "America/New_York";

/// Local trigger time: one minute after the regular-session open.
pub const DEFAULT_RUN_AT: &str = "09:31";

/// Root directory for daily results and history.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Directory for the process log file.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "maxpain.log";
