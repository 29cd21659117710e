//! Error types for the HTTP transport layer.

/// Errors that can occur while performing an HTTP exchange with the upstream
/// API.
///
/// Transport errors are fatal for the request that produced them: the cached
/// transport never retries (retries, if desired, belong to the HTTP client
/// configuration) and never serves stale data in place of a failed exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request could not be completed (connection, TLS, timeout).
    #[error("Request to {url} failed: {source}")]
    Request {
        /// The URL that was being fetched
        url: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The upstream responded with a non-success status code.
    #[error("Request to {url} returned status {status}")]
    Status {
        /// The URL that was being fetched
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// The response body could not be decoded as JSON.
    #[error("Failed to decode response body from {url}: {source}")]
    Decode {
        /// The URL that was being fetched
        url: String,
        /// The underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// A request URL could not be constructed.
    #[error("Invalid request URL {url}: {source}")]
    InvalidUrl {
        /// The URL (or URL fragment) that failed to parse
        url: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },
}

impl TransportError {
    /// Create a `Request` error for the given URL.
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        TransportError::Request {
            url: url.into(),
            source,
        }
    }

    /// Create a `Status` error for the given URL.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        TransportError::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a `Decode` error for the given URL.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        TransportError::Decode {
            url: url.into(),
            source,
        }
    }

    /// Create an `InvalidUrl` error for the given URL.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        TransportError::InvalidUrl {
            url: url.into(),
            source,
        }
    }
}
