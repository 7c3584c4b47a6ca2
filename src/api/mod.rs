//! REST API endpoint implementations.
//!
//! Each sub-module adds high-level `async` methods to
//! [`PolygonClient`](crate::client::PolygonClient) via `impl` blocks. All
//! methods handle query encoding, HTTP transport, and error mapping
//! automatically.
//!
//! ## Usage
//!
//! ```no_run
//! use maxpain_rs::PolygonClient;
//! use maxpain_rs::types::options_snapshot::OptionsChainQuery;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), maxpain_rs::error::FetchError> {
//! let client = PolygonClient::new("api-key")?;
//! let price = client.get_underlying_price("SPY").await?;
//! let page = client.get_options_chain("SPY", &OptionsChainQuery::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Endpoints | Description |
//! |---|---|---|
//! | [`aggregates`] | 2 | Previous close, daily bars |
//! | [`options_snapshot`] | 1 | Paginated options chain snapshot |

pub mod aggregates;
pub mod options_snapshot;
