//! Error types for insights data access.

use thiserror::Error;

/// Result type alias for insights operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Errors that can occur while fetching or shaping insights data.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("request to {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("request to {location} returned {status}")]
    Status {
        location: String,
        status: reqwest::StatusCode,
    },

    /// Reading a local data file failed.
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The tabular payload could not be parsed.
    #[error("malformed CSV in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A JSON document could not be decoded.
    #[error("malformed JSON from {location}: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid environment or client configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A trend name other than vaccination, intent or safety.
    #[error("unknown trend type: {0}")]
    UnknownTrendType(String),

    /// A serialized query key without exactly four fields.
    #[error("invalid query key: {0:?}")]
    InvalidQueryKey(String),
}

impl InsightsError {
    pub(crate) fn csv(file: &str, source: csv::Error) -> Self {
        Self::Csv {
            file: file.to_string(),
            source,
        }
    }
}
