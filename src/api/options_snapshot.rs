//! Options snapshot endpoints — paginated chain for an underlying.

use url::Url;

use crate::client::{FetchResult, PolygonClient};
use crate::types::options_snapshot::*;

impl PolygonClient {
    /// Retrieve the first page of the options chain snapshot for an underlying.
    ///
    /// Returns strike, side, expiration, open interest and session data for
    /// every listed contract matching the query.
    ///
    /// **Endpoint:** `GET /v3/snapshot/options/{underlying}`
    pub async fn get_options_chain(
        &self,
        underlying: &str,
        query: &OptionsChainQuery,
    ) -> FetchResult<OptionsChainPage> {
        self.get(
            &format!("/v3/snapshot/options/{underlying}"),
            &query.to_query_pairs(),
        )
        .await
    }

    /// Follow a `next_url` cursor returned by [`get_options_chain`](Self::get_options_chain).
    pub async fn get_options_chain_next(&self, next_url: &str) -> FetchResult<OptionsChainPage> {
        self.get_url(Url::parse(next_url)?).await
    }
}
