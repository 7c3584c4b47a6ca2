//! Integration tests against the real Polygon.io API.
//!
//! # Running
//!
//! These tests require a Polygon.io API key with options data access:
//!
//! ```sh
//! export POLYGON_API_KEY="your-api-key"
//! cargo test --test live -- --nocapture
//! ```
//!
//! Without the env var, every test is silently skipped.
//!
//! # What is tested
//!
//! - **Price** — previous close for a liquid ETF
//! - **Chain** — first snapshot page deserializes
//! - **Fetcher** — nearest expiration through to a max-pain result
//! - **Error handling** — a bad key produces `FetchError::Unauthorized`

use chrono::Utc;
use chrono_tz::America::New_York;
use rust_decimal::Decimal;

use maxpain_rs::PolygonClient;
use maxpain_rs::calculator::MaxPainCalculator;
use maxpain_rs::error::FetchError;
use maxpain_rs::fetcher::{ChainFetcher, PolygonChainFetcher};
use maxpain_rs::types::options_snapshot::OptionsChainQuery;

const TICKER: &str = "SPY";

/// Helper: create a live client or skip the test.
fn live_client() -> Option<PolygonClient> {
    let key = std::env::var("POLYGON_API_KEY").ok()?;
    if key.is_empty() {
        return None;
    }
    PolygonClient::new(key).ok()
}

/// Macro to skip a test when credentials are missing.
macro_rules! require_client {
    () => {
        match live_client() {
            Some(c) => c,
            None => {
                eprintln!("⏭  Skipped (POLYGON_API_KEY not set)");
                return;
            }
        }
    };
}

// ===================================================================
// Aggregates
// ===================================================================

#[tokio::test]
async fn test_underlying_price() {
    let client = require_client!();
    let price = client
        .get_underlying_price(TICKER)
        .await
        .expect("get_underlying_price failed");
    assert!(price > Decimal::ZERO);
    println!("✔ {TICKER} price: {price}");
}

// ===================================================================
// Options snapshot
// ===================================================================

#[tokio::test]
async fn test_options_chain_page() {
    let client = require_client!();
    let query = OptionsChainQuery {
        expiration_date_gte: Some(Utc::now().with_timezone(&New_York).date_naive()),
        limit: 10,
        ..OptionsChainQuery::default()
    };
    let page = client
        .get_options_chain(TICKER, &query)
        .await
        .expect("get_options_chain failed");
    assert!(!page.results.is_empty(), "chain page should not be empty");
    println!(
        "✔ Chain page: {} contracts, more pages: {}",
        page.results.len(),
        page.next_url.is_some()
    );
}

// ===================================================================
// Fetcher → calculator
// ===================================================================

#[tokio::test]
async fn test_nearest_expiration_max_pain() {
    let client = require_client!();
    let fetcher = PolygonChainFetcher::new(client, New_York, Decimal::ONE_HUNDRED);
    let snapshot = fetcher.fetch_chain(TICKER, 1).await.expect("fetch_chain failed");

    let expiration = snapshot
        .nearest_liquid_expiration(0)
        .expect("nearest expiration should have open interest");
    let result = MaxPainCalculator::default()
        .compute(&snapshot, expiration)
        .expect("compute failed");
    println!(
        "✔ {TICKER} {expiration}: max pain {} vs price {} ({} contracts)",
        result.max_pain_strike, result.current_price, result.contracts_analyzed
    );
}

// ===================================================================
// Error handling
// ===================================================================

#[tokio::test]
async fn test_bad_key_is_unauthorized() {
    let _ = require_client!();
    let client = PolygonClient::new("definitely-not-a-key").expect("client");
    let err = client
        .get_underlying_price(TICKER)
        .await
        .expect_err("bad key should be rejected");
    assert!(matches!(err, FetchError::Unauthorized { .. }), "got {err:?}");
    println!("✔ Bad key rejected: {err}");
}
