//! Transport error types.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

/// Classified failure of a single upstream request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Upstream did not respond within the deadline.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// No connection could be established, or it broke mid-transfer.
    #[error("Connection to {url} failed: {message}")]
    ConnectionFailure { url: String, message: String },

    /// Upstream answered with a well-formed HTTP error status.
    #[error("{url} responded with HTTP {status}")]
    Upstream {
        url: String,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {message}")]
    Setup { message: String },
}

impl TransportError {
    /// Returns the HTTP status for upstream error responses.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response headers for upstream error responses.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Upstream { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

/// Failure while draining a response body under a size ceiling.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The stream broke.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// More bytes arrived than the ceiling allows.
    #[error("Body exceeded {limit} bytes (read {observed})")]
    TooLarge { limit: u64, observed: u64 },
}
