//! Error types for the reasoning client.

use std::time::Duration;

/// Result type for reasoning operations.
pub type Result<T> = std::result::Result<T, ReasoningError>;

/// Reasons an attempt did not produce usable content.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    /// No API key is configured.
    #[error("reasoning service not configured")]
    NotConfigured,

    /// The service answered 429.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Wait advertised by the service, if any.
        retry_after: Option<Duration>,
    },

    /// The service answered 5xx.
    #[error("server error: HTTP {status}")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// The service rejected the request (4xx other than 429).
    #[error("client error: HTTP {status}: {body}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned no content.
    #[error("empty response")]
    EmptyResponse,

    /// The content could not be parsed as a JSON object, even after repairs.
    #[error("unparseable response: {0}")]
    Unparseable(String),
}

impl ReasoningError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Server { .. } | Self::Timeout => true,
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::NotConfigured
            | Self::Client { .. }
            | Self::EmptyResponse
            | Self::Unparseable(_) => false,
        }
    }

    /// Whether this is a rate-limit response.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<ReasoningError> for adcast_core::AdcastError {
    fn from(err: ReasoningError) -> Self {
        Self::ReasoningUnavailable(err.to_string())
    }
}
