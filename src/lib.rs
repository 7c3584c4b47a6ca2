//! # maxpain-rs
//!
//! Daily max-pain analysis of equity options chains.
//!
//! A run fetches the options chain of one underlying from
//! [Polygon.io](https://polygon.io/docs/options), computes the max-pain
//! strike of its nearest expirations, and writes a JSON result, a text
//! report and a row in a CSV history.
//!
//! ## Quick Start
//!
//! ```no_run
//! use maxpain_rs::config::Config;
//! use maxpain_rs::fetcher::PolygonChainFetcher;
//! use maxpain_rs::runner::Runner;
//! use maxpain_rs::PolygonClient;
//!
//! #[tokio::main]
//! async fn main() -> maxpain_rs::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = PolygonClient::new(config.api_key()?.expose())?;
//!     let fetcher = PolygonChainFetcher::new(client, config.market_timezone, config.contract_multiplier);
//!     let report = Runner::new(fetcher, &config).run_once().await?;
//!     println!("max pain: {}", report.results[0].max_pain_strike);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod calculator;
pub mod chain;
pub mod client;
pub mod config;
pub mod constants;
pub mod demo;
pub mod error;
pub mod fetcher;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod types;

/// Re-export the provider client at crate root for convenience.
pub use client::PolygonClient;
/// Re-export the error type and Result alias.
pub use error::{MaxPainError, Result};
