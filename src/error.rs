//! Error types for the `maxpain-rs` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, MaxPainError>`.
//!
//! [`MaxPainError`] is split along the stages of a run:
//! - **Fetch errors** — Network, authentication and malformed-response
//!   failures talking to the market-data provider ([`FetchError`])
//! - **No contracts** — An expiration with nothing to aggregate
//! - **Invalid expiration** — An expiration the snapshot does not contain
//! - **Overflow** — Open interest beyond what the pain sums can hold
//! - **Write errors** — Filesystem failures writing an artifact ([`WriteError`])
//! - **Configuration errors** — Missing or unparsable settings ([`ConfigError`])

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Error response returned by the Polygon.io API.
///
/// Polygon reports failures as `{"status": "ERROR", "error": "..."}` or
/// `{"status": "NOT_AUTHORIZED", "message": "..."}` depending on the endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Provider status string (e.g. `"ERROR"`, `"NOT_AUTHORIZED"`).
    #[serde(default)]
    pub status: Option<String>,
    /// Request identifier, useful when contacting support.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Error description (most endpoints).
    #[serde(default)]
    pub error: Option<String>,
    /// Error description (authorization failures).
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Whether the provider rejected the request's credentials.
    pub fn is_not_authorized(&self) -> bool {
        self.status.as_deref() == Some("NOT_AUTHORIZED")
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (request {})",
            self.status.as_deref().unwrap_or("UNKNOWN"),
            self.error
                .as_deref()
                .or(self.message.as_deref())
                .unwrap_or("No message"),
            self.request_id.as_deref().unwrap_or("-"),
        )
    }
}

/// Failure retrieving a chain snapshot from the data provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A structured error response returned by the provider.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The provider rejected the API key.
    #[error("authentication failed (HTTP {status}): {body}")]
    Unauthorized {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to deserialize a JSON response body.
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The provider answered successfully but with nothing usable.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// The provider answered with data that violates its own contract.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,
}

/// Failure writing one of the run artifacts.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Filesystem failure on a specific path.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV history could not be read back or re-encoded.
    #[error("CSV history error in {}: {source}", path.display())]
    Csv {
        /// The history file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The JSON result could not be encoded.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid or missing configuration, detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// Environment variable is set but cannot be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: String,
        /// Raw value as found in the environment.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// All possible errors produced by `maxpain-rs`.
#[derive(Debug, thiserror::Error)]
pub enum MaxPainError {
    /// The chain snapshot could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The snapshot has no contracts with open interest for this expiration.
    #[error("no contracts with open interest for expiration {expiration}")]
    NoContracts {
        /// The requested expiration.
        expiration: NaiveDate,
    },

    /// The requested expiration is not part of the snapshot.
    #[error("expiration {expiration} is not present in the chain snapshot")]
    InvalidExpiration {
        /// The requested expiration.
        expiration: NaiveDate,
    },

    /// Open interest too large for the pain sums to be represented.
    #[error("open interest for expiration {expiration} overflows the pain calculation")]
    Overflow {
        /// The requested expiration.
        expiration: NaiveDate,
    },

    /// An output artifact could not be written.
    #[error("write failed: {0}")]
    Write(#[from] WriteError),

    /// Startup configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MaxPainError>;
