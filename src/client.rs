//! Core HTTP client for the Polygon.io REST API.
//!
//! The [`PolygonClient`] struct wraps [`reqwest::Client`] with the bearer
//! authentication header and provides typed `get` helpers. Endpoint methods
//! are added to `PolygonClient` via `impl` blocks in the [`crate::api`]
//! module.

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::constants::API_BASE_URL;
use crate::error::{ApiErrorBody, FetchError};

/// Result alias for transport-level calls.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Core HTTP client for the Polygon.io REST API.
///
/// The API key is sent as `Authorization: Bearer <key>` on every request.
/// The header value is built once at construction.
///
/// # Example
///
/// ```no_run
/// use maxpain_rs::client::PolygonClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), maxpain_rs::error::FetchError> {
/// let client = PolygonClient::new("your-api-key")?;
/// let price = client.get_underlying_price("SPY").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PolygonClient {
    http: reqwest::Client,
    /// Base URL for REST API requests (defaults to [`API_BASE_URL`]).
    base_url: String,
    auth_header: HeaderValue,
}

impl std::fmt::Debug for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonClient")
            .field("base_url", &self.base_url)
            .field("auth_header", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl PolygonClient {
    /// Create a new `PolygonClient` with the given API key.
    ///
    /// Uses the default API base URL (`https://api.polygon.io`).
    pub fn new(api_key: impl AsRef<str>) -> FetchResult<Self> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Create a new `PolygonClient` pointing at a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: impl AsRef<str>, base_url: impl Into<String>) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .build()?;

        let mut auth_header = HeaderValue::from_str(&format!("Bearer {}", api_key.as_ref()))
            .map_err(|_| FetchError::InvalidApiKey)?;
        auth_header.set_sensitive(true);

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth_header,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    /// Perform a GET request on `path` with query parameters and deserialize
    /// the JSON response.
    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> FetchResult<R> {
        let mut url = Url::parse(&self.url(path))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        self.get_url(url).await
    }

    /// Perform a GET request on an absolute URL, such as a pagination
    /// `next_url` returned by the provider.
    pub async fn get_url<R: DeserializeOwned>(&self, url: Url) -> FetchResult<R> {
        tracing::debug!(url = %url.path(), "GET");

        let resp = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.auth_header.clone())
            .send()
            .await?;

        self.handle_response(resp).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Build the full URL from a path segment.
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Default headers applied to every request.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Read a response, returning either the deserialized body or a `FetchError`.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> FetchResult<R> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(FetchError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(self.parse_error_body(status, &body))
        }
    }

    /// Try to parse the provider's JSON error structure; fall back to a raw
    /// HTTP status error. Credential rejections map to
    /// [`FetchError::Unauthorized`] regardless of body shape.
    pub(crate) fn parse_error_body(&self, status: reqwest::StatusCode, body: &str) -> FetchError {
        let api_err = serde_json::from_str::<ApiErrorBody>(body).ok();

        let rejected = matches!(
            status,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) || api_err.as_ref().is_some_and(ApiErrorBody::is_not_authorized);
        if rejected {
            return FetchError::Unauthorized {
                status,
                body: body.to_owned(),
            };
        }

        match api_err {
            Some(api_err) if api_err.error.is_some() || api_err.message.is_some() => {
                FetchError::Api(api_err)
            }
            _ => FetchError::HttpStatus {
                status,
                body: body.to_owned(),
            },
        }
    }
}
