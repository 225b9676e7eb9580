//! Error types for provider API calls.

/// Result type for provider API calls.
pub type Result<T> = std::result::Result<T, ProviderApiError>;

/// Errors from one provider API call.
///
/// These never leave an adapter: the adapter turns them into a `ProviderResult`.
#[derive(Debug, thiserror::Error)]
pub enum ProviderApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call did not finish within the step timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The provider returned an error.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the provider.
        message: String,
    },

    /// The response did not contain an expected field.
    #[error("response missing field: {0}")]
    MissingField(&'static str),

    /// Required credentials or account identifiers are not configured.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
}
